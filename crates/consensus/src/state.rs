use alloy_primitives::B256;
use ssz::DecodeError;

use crate::fork::ForkName;

/// Offsets of the fixed fields every fork's `BeaconState` starts with:
/// `genesis_time: u64`, `genesis_validators_root: Root`, `slot: u64`.
const GENESIS_TIME_OFFSET: usize = 0;
const GENESIS_VALIDATORS_ROOT_OFFSET: usize = 8;
const SLOT_OFFSET: usize = 40;
const MIN_STATE_PREFIX_LEN: usize = 48;

/// A beacon state held as fork-tagged raw SSZ.
///
/// The gateway downloads states as `application/octet-stream`, serves them
/// back the same way, and never walks their interior; the only fields it
/// reads live in the fork-invariant prefix. The hash tree root of the state
/// is the `state_root` of the block that references it, which is the key the
/// state is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedBeaconState {
    version: ForkName,
    ssz: Vec<u8>,
}

impl VersionedBeaconState {
    pub fn from_ssz_bytes(version: ForkName, ssz: Vec<u8>) -> Result<Self, DecodeError> {
        if ssz.len() < MIN_STATE_PREFIX_LEN {
            return Err(DecodeError::InvalidByteLength {
                len: ssz.len(),
                expected: MIN_STATE_PREFIX_LEN,
            });
        }

        Ok(Self { version, ssz })
    }

    pub fn version(&self) -> ForkName {
        self.version
    }

    pub fn slot(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.ssz[SLOT_OFFSET..SLOT_OFFSET + 8]);
        u64::from_le_bytes(bytes)
    }

    pub fn genesis_time(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.ssz[GENESIS_TIME_OFFSET..GENESIS_TIME_OFFSET + 8]);
        u64::from_le_bytes(bytes)
    }

    pub fn genesis_validators_root(&self) -> B256 {
        B256::from_slice(
            &self.ssz[GENESIS_VALIDATORS_ROOT_OFFSET..GENESIS_VALIDATORS_ROOT_OFFSET + 32],
        )
    }

    pub fn as_ssz_bytes(&self) -> &[u8] {
        &self.ssz
    }

    pub fn ssz_len(&self) -> usize {
        self.ssz.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_prefix(genesis_time: u64, genesis_validators_root: B256, slot: u64) -> Vec<u8> {
        let mut ssz = Vec::new();
        ssz.extend_from_slice(&genesis_time.to_le_bytes());
        ssz.extend_from_slice(genesis_validators_root.as_slice());
        ssz.extend_from_slice(&slot.to_le_bytes());
        ssz
    }

    #[test]
    fn test_reads_fixed_prefix() {
        let root = B256::repeat_byte(0x11);
        let state =
            VersionedBeaconState::from_ssz_bytes(ForkName::Deneb, state_prefix(1_606_824_023, root, 3232))
                .expect("valid prefix");

        assert_eq!(state.version(), ForkName::Deneb);
        assert_eq!(state.genesis_time(), 1_606_824_023);
        assert_eq!(state.genesis_validators_root(), root);
        assert_eq!(state.slot(), 3232);
    }

    #[test]
    fn test_rejects_truncated_state() {
        assert!(VersionedBeaconState::from_ssz_bytes(ForkName::Phase0, vec![0u8; 47]).is_err());
    }

    #[test]
    fn test_ssz_passthrough_is_lossless() {
        let ssz = state_prefix(1, B256::ZERO, 2);
        let state = VersionedBeaconState::from_ssz_bytes(ForkName::Capella, ssz.clone()).unwrap();

        assert_eq!(state.as_ssz_bytes(), ssz.as_slice());
    }
}
