use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{VariableList, typenum};
use tree_hash_derive::TreeHash;

/// An EIP-4881 deposit tree snapshot, served alongside the checkpoint bundle
/// so bootstrapping nodes can resume deposit tracking.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct DepositSnapshot {
    pub finalized: VariableList<B256, typenum::U32>,
    pub deposit_root: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub deposit_count: u64,
    pub execution_block_hash: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub execution_block_height: u64,
}
