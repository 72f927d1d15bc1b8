use std::sync::Arc;

use checkpointz_beacon::FinalityProvider;
use warp::{
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    reject::Rejection,
    reply::{Reply, with_header},
};

use crate::types::{
    content_type::{ContentType, ETH_CONSENSUS_VERSION_HEADER, SSZ_CONTENT_TYPE},
    errors::ApiError,
    id::{BlockId, StateId},
    response::{DataResponse, RootResponse, VersionedDataResponse},
};

/// Called by `/eth/v1/beacon/genesis`.
pub async fn get_genesis(provider: Arc<FinalityProvider>) -> Result<impl Reply, Rejection> {
    let genesis = provider.genesis().map_err(ApiError::from)?;

    Ok(with_header(
        DataResponse::json(genesis),
        CACHE_CONTROL,
        "public, s-max-age=30",
    ))
}

/// Called by `/eth/v1/beacon/blocks/{block_id}/root`.
pub async fn get_block_root(
    block_id: String,
    provider: Arc<FinalityProvider>,
) -> Result<impl Reply, Rejection> {
    let block_id = block_id
        .parse::<BlockId>()
        .map_err(ApiError::BadRequest)?;

    let block = super::resolve_block(&provider, &block_id)?;
    let root = provider.encoder().block_root(&block).map_err(ApiError::from)?;

    Ok(with_header(
        DataResponse::json(RootResponse { root }),
        CACHE_CONTROL,
        block_id.cache_control(),
    ))
}

/// Called by `/eth/v1/beacon/states/{state_id}/finality_checkpoints`.
/// `head` reports the aggregated head; `finalized` reports the serving
/// checkpoint.
pub async fn get_finality_checkpoints(
    state_id: String,
    provider: Arc<FinalityProvider>,
) -> Result<impl Reply, Rejection> {
    let state_id = state_id
        .parse::<StateId>()
        .map_err(ApiError::BadRequest)?;

    let finality = match state_id {
        StateId::Head => provider.head().map_err(ApiError::from)?,
        StateId::Finalized => provider.finalized().map_err(ApiError::from)?,
        other => {
            return Err(ApiError::BadRequest(format!(
                "finality checkpoints are only available for head and finalized, not {other}"
            ))
            .into());
        }
    };

    Ok(with_header(
        DataResponse::json(finality),
        CACHE_CONTROL,
        "public, s-max-age=5",
    ))
}

/// Called by `/eth/v1/beacon/deposit_snapshot` to serve the snapshot at the
/// serving finalized epoch.
pub async fn get_deposit_snapshot(
    provider: Arc<FinalityProvider>,
) -> Result<impl Reply, Rejection> {
    let serving = provider.finalized().map_err(ApiError::from)?;
    let snapshot = provider
        .get_deposit_snapshot(serving.finalized.epoch)
        .map_err(ApiError::from)?;

    Ok(DataResponse::json(snapshot.as_ref()))
}

/// Called by `/eth/v1/beacon/blob_sidecars/{block_id}`, serving the cached
/// sidecars for the resolved block's slot.
pub async fn get_blob_sidecars(
    block_id: String,
    provider: Arc<FinalityProvider>,
) -> Result<impl Reply, Rejection> {
    let block_id = block_id
        .parse::<BlockId>()
        .map_err(ApiError::BadRequest)?;

    let block = super::resolve_block(&provider, &block_id)?;
    let sidecars = provider
        .get_blob_sidecars_by_slot(block.slot())
        .map_err(ApiError::from)?;

    Ok(with_header(
        DataResponse::json(sidecars.as_ref()),
        CACHE_CONTROL,
        block_id.cache_control(),
    ))
}

/// Called by `/eth/v2/beacon/blocks/{block_id}`, serving JSON or SSZ per
/// the `Accept` header.
pub async fn get_block(
    block_id: String,
    accept: Option<String>,
    provider: Arc<FinalityProvider>,
) -> Result<warp::reply::Response, Rejection> {
    let block_id = block_id
        .parse::<BlockId>()
        .map_err(ApiError::BadRequest)?;

    let block = super::resolve_block(&provider, &block_id)?;
    let version = block.version().to_string();

    match ContentType::from_accept(accept.as_deref()) {
        ContentType::Json => {
            let data = provider
                .encoder()
                .encode_block_json(&block)
                .map_err(ApiError::from)?;

            Ok(with_header(
                VersionedDataResponse::json(version, data),
                CACHE_CONTROL,
                block_id.cache_control(),
            )
            .into_response())
        }
        ContentType::Ssz => {
            let ssz = provider
                .encoder()
                .encode_block_ssz(&block)
                .map_err(ApiError::from)?;

            let response = warp::http::Response::builder()
                .header(CONTENT_TYPE, SSZ_CONTENT_TYPE)
                .header(ETH_CONSENSUS_VERSION_HEADER, version)
                .header(CACHE_CONTROL, block_id.cache_control())
                .body(ssz.into())
                .map_err(|_| ApiError::InternalError("failed to build response".to_string()))?;

            Ok(response)
        }
    }
}
