use checkpointz_consensus::checkpoint::Finality;
use serde::Serialize;

/// Per-upstream status as reported by `/checkpointz/v1/status`.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamStatus {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finality: Option<Finality>,
}

/// A pool member as reported by `/eth/v1/node/peers`.
#[derive(Debug, Clone, Serialize)]
pub struct Peer {
    pub peer_id: String,
    pub state: &'static str,
    pub direction: &'static str,
}

/// Aggregate sync state as reported by `/eth/v1/node/syncing`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SyncState {
    pub is_syncing: bool,
    #[serde(with = "serde_utils::quoted_u64")]
    pub head_slot: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub sync_distance: u64,
}
