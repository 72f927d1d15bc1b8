use std::{sync::Arc, time::SystemTime};

use alloy_primitives::B256;
use checkpointz_cache::TtlCache;
use checkpointz_consensus::state::VersionedBeaconState;
use tokio::sync::watch;
use tracing::debug;

use crate::{config::StoreConfig, error::Result};

/// Beacon state store keyed by state root. The state accompanying the
/// genesis block (slot 0) is stored invincible.
pub struct StateStore {
    store: Arc<TtlCache<Arc<VersionedBeaconState>>>,
}

impl StateStore {
    pub fn new(config: StoreConfig) -> Self {
        let store = Arc::new(TtlCache::new(config.max_items, "state"));

        store.on_item_deleted(|key, _state: &Arc<VersionedBeaconState>, _| {
            debug!(state_root = %key, "State was removed from the cache");
        });

        Self { store }
    }

    pub fn start(&self, shutdown: watch::Receiver<bool>) {
        Arc::clone(&self.store).start_sweeper(shutdown);
    }

    pub fn add(
        &self,
        state_root: B256,
        state: Arc<VersionedBeaconState>,
        expires_at: SystemTime,
        slot: u64,
    ) {
        self.store
            .add(&state_root.to_string(), state, expires_at, slot == 0);

        debug!(state_root = %state_root, slot, "Added state");
    }

    pub fn get_by_state_root(&self, state_root: B256) -> Result<Arc<VersionedBeaconState>> {
        let (state, _) = self.store.get(&state_root.to_string())?;

        Ok(state)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use checkpointz_consensus::fork::ForkName;

    use super::*;
    use crate::error::Error;

    fn test_state(slot: u64) -> Arc<VersionedBeaconState> {
        let mut ssz = Vec::new();
        ssz.extend_from_slice(&1_606_824_023u64.to_le_bytes());
        ssz.extend_from_slice(B256::ZERO.as_slice());
        ssz.extend_from_slice(&slot.to_le_bytes());

        Arc::new(VersionedBeaconState::from_ssz_bytes(ForkName::Capella, ssz).unwrap())
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let store = StateStore::new(StoreConfig { max_items: 5 });
        let state_root = B256::repeat_byte(0x42);

        store.add(
            state_root,
            test_state(64),
            SystemTime::now() + Duration::from_secs(60),
            64,
        );

        assert_eq!(store.get_by_state_root(state_root).unwrap().slot(), 64);
        assert!(matches!(
            store.get_by_state_root(B256::repeat_byte(0x43)),
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_genesis_state_is_pinned() {
        let store = StateStore::new(StoreConfig { max_items: 3 });
        let now = SystemTime::now();
        let genesis_root = B256::repeat_byte(0x01);

        store.add(genesis_root, test_state(0), now + Duration::from_secs(1), 0);
        store.add(B256::repeat_byte(2), test_state(32), now + Duration::from_secs(100), 32);
        store.add(B256::repeat_byte(3), test_state(64), now + Duration::from_secs(200), 64);

        // The capacity eviction must pick a non-genesis state.
        store.add(B256::repeat_byte(4), test_state(96), now + Duration::from_secs(300), 96);

        assert!(store.get_by_state_root(genesis_root).is_ok());
        assert!(matches!(
            store.get_by_state_root(B256::repeat_byte(2)),
            Err(Error::NotFound)
        ));
    }
}
