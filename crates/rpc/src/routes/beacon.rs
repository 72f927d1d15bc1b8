use std::sync::Arc;

use checkpointz_beacon::FinalityProvider;
use warp::{Filter, get, header, path, reject::Rejection, reply::Reply};

use super::with_provider;
use crate::handlers::beacon::{
    get_blob_sidecars, get_block, get_block_root, get_deposit_snapshot,
    get_finality_checkpoints, get_genesis,
};

/// Creates and returns all `/eth/v{1,2}/beacon` routes.
pub fn routes(
    provider: Arc<FinalityProvider>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let genesis = path!("eth" / "v1" / "beacon" / "genesis")
        .and(get())
        .and(with_provider(Arc::clone(&provider)))
        .and_then(get_genesis);

    let block_root = path!("eth" / "v1" / "beacon" / "blocks" / String / "root")
        .and(get())
        .and(with_provider(Arc::clone(&provider)))
        .and_then(get_block_root);

    let finality_checkpoints =
        path!("eth" / "v1" / "beacon" / "states" / String / "finality_checkpoints")
            .and(get())
            .and(with_provider(Arc::clone(&provider)))
            .and_then(get_finality_checkpoints);

    let deposit_snapshot = path!("eth" / "v1" / "beacon" / "deposit_snapshot")
        .and(get())
        .and(with_provider(Arc::clone(&provider)))
        .and_then(get_deposit_snapshot);

    let blob_sidecars = path!("eth" / "v1" / "beacon" / "blob_sidecars" / String)
        .and(get())
        .and(with_provider(Arc::clone(&provider)))
        .and_then(get_blob_sidecars);

    let block = path!("eth" / "v2" / "beacon" / "blocks" / String)
        .and(get())
        .and(header::optional::<String>("accept"))
        .and(with_provider(provider))
        .and_then(get_block);

    genesis
        .or(block_root)
        .or(finality_checkpoints)
        .or(deposit_snapshot)
        .or(blob_sidecars)
        .or(block)
}
