use std::sync::Arc;

use checkpointz_beacon::FinalityProvider;
use warp::{Filter, get, path, reject::Rejection, reply::Reply};

use super::with_provider;
use crate::handlers::config::{get_deposit_contract, get_fork_schedule, get_spec};

/// Creates and returns all `/eth/v1/config` routes.
pub fn routes(
    provider: Arc<FinalityProvider>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let spec = path!("eth" / "v1" / "config" / "spec")
        .and(get())
        .and(with_provider(Arc::clone(&provider)))
        .and_then(get_spec);

    let deposit_contract = path!("eth" / "v1" / "config" / "deposit_contract")
        .and(get())
        .and(with_provider(Arc::clone(&provider)))
        .and_then(get_deposit_contract);

    let fork_schedule = path!("eth" / "v1" / "config" / "fork_schedule")
        .and(get())
        .and(with_provider(provider))
        .and_then(get_fork_schedule);

    spec.or(deposit_contract).or(fork_schedule)
}
