use std::{sync::Arc, time::SystemTime};

use checkpointz_cache::TtlCache;
use checkpointz_consensus::deposit_snapshot::DepositSnapshot;
use tokio::sync::watch;
use tracing::debug;

use crate::{config::StoreConfig, error::Result};

/// Deposit snapshot store keyed by epoch.
pub struct DepositSnapshotStore {
    store: Arc<TtlCache<Arc<DepositSnapshot>>>,
}

impl DepositSnapshotStore {
    pub fn new(config: StoreConfig) -> Self {
        let store = Arc::new(TtlCache::new(config.max_items, "deposit_snapshot"));

        store.on_item_deleted(|key, _snapshot: &Arc<DepositSnapshot>, _| {
            debug!(epoch = %key, "Deposit snapshot was removed from the cache");
        });

        Self { store }
    }

    pub fn start(&self, shutdown: watch::Receiver<bool>) {
        Arc::clone(&self.store).start_sweeper(shutdown);
    }

    pub fn add(&self, epoch: u64, snapshot: Arc<DepositSnapshot>, expires_at: SystemTime) {
        self.store
            .add(&epoch.to_string(), snapshot, expires_at, false);

        debug!(epoch, "Added deposit snapshot");
    }

    pub fn get_by_epoch(&self, epoch: u64) -> Result<Arc<DepositSnapshot>> {
        let (snapshot, _) = self.store.get(&epoch.to_string())?;

        Ok(snapshot)
    }
}
