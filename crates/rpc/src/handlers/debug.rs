use std::sync::Arc;

use checkpointz_beacon::FinalityProvider;
use warp::{
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    reject::Rejection,
};

use crate::types::{
    content_type::{ContentType, ETH_CONSENSUS_VERSION_HEADER, SSZ_CONTENT_TYPE},
    errors::ApiError,
    id::StateId,
};

/// Called by `/eth/v2/debug/beacon/states/{state_id}`. States are served as
/// SSZ only; JSON is refused.
pub async fn get_state(
    state_id: String,
    accept: Option<String>,
    provider: Arc<FinalityProvider>,
) -> Result<warp::reply::Response, Rejection> {
    if ContentType::from_accept(accept.as_deref()) != ContentType::Ssz {
        return Err(ApiError::UnsupportedMediaType.into());
    }

    let state_id = state_id
        .parse::<StateId>()
        .map_err(ApiError::BadRequest)?;

    let state = super::resolve_state(&provider, &state_id)?;

    let response = warp::http::Response::builder()
        .header(CONTENT_TYPE, SSZ_CONTENT_TYPE)
        .header(ETH_CONSENSUS_VERSION_HEADER, state.version().to_string())
        .header(CACHE_CONTROL, state_id.cache_control())
        .body(provider.encoder().encode_state_ssz(&state).into())
        .map_err(|_| ApiError::InternalError("failed to build response".to_string()))?;

    Ok(response)
}
