use std::{convert::Infallible, sync::Arc};

use checkpointz_beacon::FinalityProvider;
use warp::{Filter, reject::Rejection, reply::Reply};

pub mod beacon;
pub mod checkpointz;
pub mod config;
pub mod debug;
pub mod node;

/// Creates and returns all routes.
pub fn get_routes(
    provider: Arc<FinalityProvider>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    beacon::routes(Arc::clone(&provider))
        .or(debug::routes(Arc::clone(&provider)))
        .or(config::routes(Arc::clone(&provider)))
        .or(node::routes(Arc::clone(&provider)))
        .or(checkpointz::routes(provider))
}

/// Creates a filter handing the provider to a handler.
pub(crate) fn with_provider(
    provider: Arc<FinalityProvider>,
) -> impl Filter<Extract = (Arc<FinalityProvider>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&provider))
}
