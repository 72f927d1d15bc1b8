use std::sync::Arc;

use checkpointz_beacon::FinalityProvider;
use serde::Serialize;
use warp::{
    http::header::CACHE_CONTROL,
    reject::Rejection,
    reply::{Reply, with_header},
};

use crate::{
    types::{errors::ApiError, response::DataResponse},
    version,
};

#[derive(Debug, Serialize)]
struct NodeVersion {
    version: String,
}

#[derive(Debug, Serialize)]
struct PeerCount {
    connected: String,
    connecting: String,
    disconnected: String,
    disconnecting: String,
}

/// Called by `/eth/v1/node/syncing`.
pub async fn get_syncing(provider: Arc<FinalityProvider>) -> Result<impl Reply, Rejection> {
    let syncing = provider.syncing().map_err(ApiError::from)?;

    Ok(with_header(
        DataResponse::json(syncing),
        CACHE_CONTROL,
        "public, s-max-age=10",
    ))
}

/// Called by `/eth/v1/node/version`.
pub async fn get_version() -> Result<impl Reply, Rejection> {
    Ok(with_header(
        DataResponse::json(NodeVersion {
            version: version::full(),
        }),
        CACHE_CONTROL,
        "public, s-max-age=60",
    ))
}

/// Called by `/eth/v1/node/peers`. Upstreams are reported as outbound
/// peers.
pub async fn get_peers(provider: Arc<FinalityProvider>) -> Result<impl Reply, Rejection> {
    Ok(with_header(
        DataResponse::json(provider.peers()),
        CACHE_CONTROL,
        "public, s-max-age=60",
    ))
}

/// Called by `/eth/v1/node/peer_count`. Upstreams are either connected or
/// disconnected; the gateway never reports transitional states.
pub async fn get_peer_count(provider: Arc<FinalityProvider>) -> Result<impl Reply, Rejection> {
    let connected = provider.peer_count();
    let disconnected = (provider.peers().len() as u64).saturating_sub(connected);

    Ok(with_header(
        DataResponse::json(PeerCount {
            connected: connected.to_string(),
            connecting: "0".to_string(),
            disconnected: disconnected.to_string(),
            disconnecting: "0".to_string(),
        }),
        CACHE_CONTROL,
        "public, s-max-age=60",
    ))
}
