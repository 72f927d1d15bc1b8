use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

/// An `(epoch, root)` pair the chain has committed to. A zero root means the
/// checkpoint is not yet known.
#[derive(
    Debug, Default, Eq, Hash, PartialEq, Clone, Copy, Serialize, Deserialize, Encode, Decode,
    TreeHash,
)]
pub struct Checkpoint {
    #[serde(with = "serde_utils::quoted_u64")]
    pub epoch: u64,
    pub root: B256,
}

impl Checkpoint {
    pub fn new(epoch: u64, root: B256) -> Self {
        Self { epoch, root }
    }

    pub fn is_unknown(&self) -> bool {
        self.root == B256::ZERO
    }
}

/// The finality triple an upstream reports via
/// `/eth/v1/beacon/states/{state_id}/finality_checkpoints`.
#[derive(Debug, Default, Eq, Hash, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Finality {
    pub previous_justified: Checkpoint,
    pub current_justified: Checkpoint,
    pub finalized: Checkpoint,
}

impl Finality {
    pub fn new(
        previous_justified: Checkpoint,
        current_justified: Checkpoint,
        finalized: Checkpoint,
    ) -> Self {
        Self {
            previous_justified,
            current_justified,
            finalized,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_zero_root_is_unknown() {
        assert!(Checkpoint::default().is_unknown());
        assert!(!Checkpoint::new(0, B256::from_str(&format!("0x{}", "11".repeat(32))).unwrap())
            .is_unknown());
    }

    #[test]
    fn test_epoch_is_quoted_in_json() {
        let checkpoint = Checkpoint::new(42, B256::ZERO);

        let json = serde_json::to_value(&checkpoint).unwrap();
        assert_eq!(json["epoch"], "42");
    }
}
