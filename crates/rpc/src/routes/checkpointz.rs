use std::sync::Arc;

use checkpointz_beacon::FinalityProvider;
use warp::{Filter, get, path, reject::Rejection, reply::Reply};

use super::with_provider;
use crate::handlers::checkpointz::{get_ready, get_slot, get_slots, get_status};

/// Creates and returns all `/checkpointz/v1` routes.
pub fn routes(
    provider: Arc<FinalityProvider>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let status = path!("checkpointz" / "v1" / "status")
        .and(get())
        .and(with_provider(Arc::clone(&provider)))
        .and_then(get_status);

    let slots = path!("checkpointz" / "v1" / "beacon" / "slots")
        .and(get())
        .and(with_provider(Arc::clone(&provider)))
        .and_then(get_slots);

    let slot = path!("checkpointz" / "v1" / "beacon" / "slots" / u64)
        .and(get())
        .and(with_provider(Arc::clone(&provider)))
        .and_then(get_slot);

    let ready = path!("checkpointz" / "v1" / "ready")
        .and(get())
        .and(with_provider(provider))
        .and_then(get_ready);

    status.or(slots).or(slot).or(ready)
}
