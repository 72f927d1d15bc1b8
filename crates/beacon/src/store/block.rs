use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::SystemTime,
};

use alloy_primitives::B256;
use checkpointz_cache::TtlCache;
use checkpointz_consensus::block::VersionedSignedBeaconBlock;
use tokio::sync::watch;
use tracing::debug;

use crate::{
    config::StoreConfig,
    error::{Error, Result},
};

/// Block store keyed by block root, with slot and state-root secondary
/// indices. Indices are purged through the cache's deletion callback, so
/// eviction and expiry both clean up after themselves. Genesis blocks
/// (slot 0) are stored invincible and never displaced.
pub struct BlockStore {
    store: Arc<TtlCache<Arc<VersionedSignedBeaconBlock>>>,
    slot_to_root: Arc<RwLock<HashMap<u64, B256>>>,
    state_root_to_root: Arc<RwLock<HashMap<B256, B256>>>,
}

impl BlockStore {
    pub fn new(config: StoreConfig) -> Self {
        let store = Arc::new(TtlCache::new(config.max_items, "block"));
        let slot_to_root = Arc::new(RwLock::new(HashMap::new()));
        let state_root_to_root = Arc::new(RwLock::new(HashMap::new()));

        {
            let slot_to_root = Arc::clone(&slot_to_root);
            let state_root_to_root = Arc::clone(&state_root_to_root);

            store.on_item_deleted(move |key, block: &Arc<VersionedSignedBeaconBlock>, _| {
                debug!(block_root = %key, "Block was removed from the cache");

                slot_to_root
                    .write()
                    .expect("slot index lock poisoned")
                    .remove(&block.slot());
                state_root_to_root
                    .write()
                    .expect("state root index lock poisoned")
                    .remove(&block.state_root());
            });
        }

        Self {
            store,
            slot_to_root,
            state_root_to_root,
        }
    }

    pub fn start(&self, shutdown: watch::Receiver<bool>) {
        Arc::clone(&self.store).start_sweeper(shutdown);
    }

    /// Adds a block, deriving its root, slot and state root from the
    /// versioned object. Blocks at slot 0 are invincible.
    pub fn add(&self, block: Arc<VersionedSignedBeaconBlock>, expires_at: SystemTime) {
        let root = block.root();
        let slot = block.slot();
        let state_root = block.state_root();

        self.store
            .add(&root.to_string(), Arc::clone(&block), expires_at, slot == 0);

        self.slot_to_root
            .write()
            .expect("slot index lock poisoned")
            .insert(slot, root);
        self.state_root_to_root
            .write()
            .expect("state root index lock poisoned")
            .insert(state_root, root);

        debug!(
            block_root = %root,
            slot,
            state_root = %state_root,
            "Added block"
        );
    }

    pub fn get_by_root(&self, root: B256) -> Result<Arc<VersionedSignedBeaconBlock>> {
        let (block, _) = self.store.get(&root.to_string())?;

        Ok(block)
    }

    pub fn get_by_slot(&self, slot: u64) -> Result<Arc<VersionedSignedBeaconBlock>> {
        let root = self
            .slot_to_root
            .read()
            .expect("slot index lock poisoned")
            .get(&slot)
            .copied()
            .ok_or(Error::NotFound)?;

        self.get_by_root(root)
    }

    pub fn get_by_state_root(&self, state_root: B256) -> Result<Arc<VersionedSignedBeaconBlock>> {
        let root = self
            .state_root_to_root
            .read()
            .expect("state root index lock poisoned")
            .get(&state_root)
            .copied()
            .ok_or(Error::NotFound)?;

        self.get_by_root(root)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use checkpointz_consensus::{
        altair,
        bytes::BlsSignature,
        eth1_data::Eth1Data,
        operations::SyncAggregate,
    };
    use ssz_types::BitVector;

    use super::*;

    fn test_block(slot: u64, state_root_byte: u8) -> Arc<VersionedSignedBeaconBlock> {
        Arc::new(VersionedSignedBeaconBlock::Altair(
            altair::SignedBeaconBlock {
                message: altair::BeaconBlock {
                    slot,
                    proposer_index: 0,
                    parent_root: B256::ZERO,
                    state_root: B256::repeat_byte(state_root_byte),
                    body: altair::BeaconBlockBody {
                        randao_reveal: BlsSignature::default(),
                        eth1_data: Eth1Data {
                            deposit_root: B256::ZERO,
                            deposit_count: 0,
                            block_hash: B256::ZERO,
                        },
                        graffiti: B256::repeat_byte(state_root_byte),
                        proposer_slashings: Default::default(),
                        attester_slashings: Default::default(),
                        attestations: Default::default(),
                        deposits: Default::default(),
                        voluntary_exits: Default::default(),
                        sync_aggregate: SyncAggregate {
                            sync_committee_bits: BitVector::new(),
                            sync_committee_signature: BlsSignature::default(),
                        },
                    },
                },
                signature: BlsSignature::default(),
            },
        ))
    }

    fn far_future() -> SystemTime {
        SystemTime::now() + Duration::from_secs(3600)
    }

    #[tokio::test]
    async fn test_lookup_by_all_indices() {
        let store = BlockStore::new(StoreConfig { max_items: 10 });
        let block = test_block(3232, 0x42);

        store.add(Arc::clone(&block), far_future());

        assert_eq!(store.get_by_root(block.root()).unwrap().root(), block.root());
        assert_eq!(store.get_by_slot(3232).unwrap().root(), block.root());
        assert_eq!(
            store.get_by_state_root(block.state_root()).unwrap().root(),
            block.root()
        );
    }

    #[tokio::test]
    async fn test_miss_returns_not_found() {
        let store = BlockStore::new(StoreConfig { max_items: 10 });

        assert!(matches!(store.get_by_slot(1), Err(Error::NotFound)));
        assert!(matches!(
            store.get_by_root(B256::repeat_byte(9)),
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_capacity_eviction_prefers_earliest_expiry() {
        let store = BlockStore::new(StoreConfig { max_items: 3 });
        let now = SystemTime::now();

        let evicted = test_block(64, 1);
        store.add(Arc::clone(&evicted), now + Duration::from_secs(10));
        store.add(test_block(96, 2), now + Duration::from_secs(100));
        store.add(test_block(128, 3), now + Duration::from_secs(100));

        store.add(test_block(160, 4), now + Duration::from_secs(100));

        assert_eq!(store.len(), 3);
        assert!(matches!(
            store.get_by_root(evicted.root()),
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_genesis_block_is_never_evicted() {
        let store = BlockStore::new(StoreConfig { max_items: 3 });
        let now = SystemTime::now();

        let genesis = test_block(0, 1);
        // Genesis carries the earliest expiry but is pinned.
        store.add(Arc::clone(&genesis), now + Duration::from_secs(1));
        store.add(test_block(32, 2), now + Duration::from_secs(500));
        store.add(test_block(64, 3), now + Duration::from_secs(100));

        store.add(test_block(96, 4), now + Duration::from_secs(400));

        assert!(store.get_by_slot(0).is_ok());
        assert!(matches!(store.get_by_slot(64), Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_eviction_purges_secondary_indices() {
        let store = BlockStore::new(StoreConfig { max_items: 1 });
        let now = SystemTime::now();

        let first = test_block(32, 1);
        store.add(Arc::clone(&first), now + Duration::from_secs(10));
        store.add(test_block(64, 2), now + Duration::from_secs(100));

        // Index purging happens on a spawned task.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(matches!(store.get_by_slot(32), Err(Error::NotFound)));
        assert!(matches!(
            store.get_by_state_root(first.state_root()),
            Err(Error::NotFound)
        ));
    }
}
