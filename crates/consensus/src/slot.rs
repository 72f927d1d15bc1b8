use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub fn compute_epoch_at_slot(slot: u64, slots_per_epoch: u64) -> u64 {
    slot / slots_per_epoch
}

pub fn compute_start_slot_at_epoch(epoch: u64, slots_per_epoch: u64) -> u64 {
    epoch * slots_per_epoch
}

pub fn is_epoch_boundary(slot: u64, slots_per_epoch: u64) -> bool {
    slot % slots_per_epoch == 0
}

/// Wall-clock window of a slot, unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTime {
    #[serde(with = "serde_utils::quoted_u64")]
    pub start_time: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub end_time: u64,
}

pub fn calculate_slot_time(slot: u64, genesis_time: u64, seconds_per_slot: u64) -> SlotTime {
    let start_time = genesis_time + slot * seconds_per_slot;

    SlotTime {
        start_time,
        end_time: start_time + seconds_per_slot,
    }
}

/// Expiry for a back-filled block: the wall clock at which the slot occurred
/// plus a history window. Older slots therefore expire before fresher ones.
pub fn calculate_block_expiration(
    slot: u64,
    seconds_per_slot: u64,
    genesis_time: u64,
    history_window: Duration,
) -> SystemTime {
    let created_at = UNIX_EPOCH + Duration::from_secs(genesis_time + slot * seconds_per_slot);

    created_at + history_window
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAINNET_GENESIS: u64 = 1_606_824_023;

    #[test]
    fn test_epoch_math() {
        assert_eq!(compute_epoch_at_slot(0, 32), 0);
        assert_eq!(compute_epoch_at_slot(31, 32), 0);
        assert_eq!(compute_epoch_at_slot(32, 32), 1);
        assert_eq!(compute_start_slot_at_epoch(101, 32), 3232);
    }

    #[test]
    fn test_epoch_boundaries() {
        assert!(is_epoch_boundary(0, 32));
        assert!(is_epoch_boundary(3232, 32));
        assert!(!is_epoch_boundary(3233, 32));
    }

    #[test]
    fn test_slot_time() {
        let genesis = calculate_slot_time(0, MAINNET_GENESIS, 12);
        assert_eq!(genesis.start_time, MAINNET_GENESIS);
        assert_eq!(genesis.end_time, MAINNET_GENESIS + 12);

        let slot_100 = calculate_slot_time(100, MAINNET_GENESIS, 12);
        assert_eq!(slot_100.start_time, MAINNET_GENESIS + 1200);
    }

    #[test]
    fn test_block_expiration_tracks_slot_age() {
        let window = Duration::from_secs(3 * 24 * 3600);

        let old = calculate_block_expiration(0, 12, MAINNET_GENESIS, window);
        let new = calculate_block_expiration(1000, 12, MAINNET_GENESIS, window);

        assert_eq!(
            new.duration_since(old).unwrap(),
            Duration::from_secs(12_000)
        );
    }
}
