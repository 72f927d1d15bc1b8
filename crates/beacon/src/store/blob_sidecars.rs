use std::{sync::Arc, time::SystemTime};

use checkpointz_cache::TtlCache;
use checkpointz_consensus::blob_sidecar::BlobSidecar;
use tokio::sync::watch;
use tracing::debug;

use crate::{config::StoreConfig, error::Result};

/// Blob sidecar store keyed by slot, holding every sidecar of the slot's
/// block as one entry.
pub struct BlobSidecarStore {
    store: Arc<TtlCache<Arc<Vec<BlobSidecar>>>>,
}

impl BlobSidecarStore {
    pub fn new(config: StoreConfig) -> Self {
        let store = Arc::new(TtlCache::new(config.max_items, "blob_sidecar"));

        store.on_item_deleted(|key, _sidecars: &Arc<Vec<BlobSidecar>>, _| {
            debug!(slot = %key, "Blob sidecars were removed from the cache");
        });

        Self { store }
    }

    pub fn start(&self, shutdown: watch::Receiver<bool>) {
        Arc::clone(&self.store).start_sweeper(shutdown);
    }

    pub fn add(&self, slot: u64, sidecars: Arc<Vec<BlobSidecar>>, expires_at: SystemTime) {
        self.store.add(&slot.to_string(), sidecars, expires_at, false);

        debug!(slot, "Added blob sidecars");
    }

    pub fn get_by_slot(&self, slot: u64) -> Result<Arc<Vec<BlobSidecar>>> {
        let (sidecars, _) = self.store.get(&slot.to_string())?;

        Ok(sidecars)
    }
}
