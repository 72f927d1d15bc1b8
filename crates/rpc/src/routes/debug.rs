use std::sync::Arc;

use checkpointz_beacon::FinalityProvider;
use warp::{Filter, get, header, path, reject::Rejection, reply::Reply};

use super::with_provider;
use crate::handlers::debug::get_state;

/// Creates and returns all `/eth/v2/debug` routes.
pub fn routes(
    provider: Arc<FinalityProvider>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    path!("eth" / "v2" / "debug" / "beacon" / "states" / String)
        .and(get())
        .and(header::optional::<String>("accept"))
        .and(with_provider(provider))
        .and_then(get_state)
}
