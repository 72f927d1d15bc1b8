use alloy_primitives::{B256, aliases::B32};
use serde::{Deserialize, Serialize};

/// Chain genesis information, fetched once from an upstream and immutable
/// thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    #[serde(with = "serde_utils::quoted_u64")]
    pub genesis_time: u64,
    pub genesis_validators_root: B256,
    pub genesis_fork_version: B32,
}
