use std::sync::Arc;

use checkpointz_beacon::FinalityProvider;
use warp::{Filter, get, path, reject::Rejection, reply::Reply};

use super::with_provider;
use crate::handlers::node::{get_peer_count, get_peers, get_syncing, get_version};

/// Creates and returns all `/eth/v1/node` routes.
pub fn routes(
    provider: Arc<FinalityProvider>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let syncing = path!("eth" / "v1" / "node" / "syncing")
        .and(get())
        .and(with_provider(Arc::clone(&provider)))
        .and_then(get_syncing);

    let version = path!("eth" / "v1" / "node" / "version")
        .and(get())
        .and_then(get_version);

    let peers = path!("eth" / "v1" / "node" / "peers")
        .and(get())
        .and(with_provider(Arc::clone(&provider)))
        .and_then(get_peers);

    let peer_count = path!("eth" / "v1" / "node" / "peer_count")
        .and(get())
        .and(with_provider(provider))
        .and_then(get_peer_count);

    syncing.or(version).or(peers).or(peer_count)
}
