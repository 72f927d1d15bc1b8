use std::{
    collections::BTreeSet,
    sync::Arc,
    time::{Duration, SystemTime},
};

use alloy_primitives::B256;
use anyhow::anyhow;
use checkpointz_consensus::{
    block::VersionedSignedBeaconBlock,
    checkpoint::Finality,
    slot::{calculate_block_expiration, is_epoch_boundary},
    state::VersionedBeaconState,
};
use checkpointz_upstream::Node;
use tracing::{error, info, warn};

use crate::{
    error::{Error, Result},
    provider::FinalityProvider,
};

/// How long a checkpoint bundle stays serveable after the chain last
/// finalized, approximating the weak-subjectivity window.
pub const FINALITY_HALTED_SERVING_PERIOD: Duration = Duration::from_secs(14 * 24 * 3600);

/// History window for back-filled epoch boundary blocks, anchored to the
/// slot's wall-clock time.
const HISTORICAL_BLOCK_RETENTION: Duration = Duration::from_secs(3 * 24 * 3600);

/// Deposit snapshots are tiny; keep them around through periods of
/// non-finality and let capacity eviction reclaim them.
const DEPOSIT_SNAPSHOT_RETENTION: Duration = Duration::from_secs(28 * 24 * 3600);

/// How many times a historical slot may fail to download before the engine
/// permanently gives up on it.
const HISTORICAL_FAILURE_LIMIT: u32 = 5;

/// Pause between historical block fetches so upstreams are not hammered.
const HISTORICAL_FETCH_PAUSE: Duration = Duration::from_millis(50);

/// The epoch-boundary slots the backfill keeps resident: genesis plus the
/// boundaries of the `historical_epoch_count - 1` epochs below the head.
pub(crate) fn historical_slots_in_scope(
    head_epoch: u64,
    slots_per_epoch: u64,
    historical_epoch_count: usize,
) -> BTreeSet<u64> {
    let mut slots = BTreeSet::from([0u64]);
    let current_slot = head_epoch * slots_per_epoch;

    for i in 1..historical_epoch_count as u64 {
        if let Some(slot) = current_slot.checked_sub(i * slots_per_epoch) {
            slots.insert(slot);
        }
    }

    slots
}

impl FinalityProvider {
    /// Downloads the bundle for the head finalized checkpoint from an
    /// upstream that already knows about it, then transitions the serving
    /// checkpoint. The caller holds `serving_mutex`.
    pub(crate) async fn download_serving_checkpoint(&self, checkpoint: Finality) -> Result<()> {
        let upstream = self
            .nodes
            .ready()
            .data_providers()
            .past_finalized_checkpoint(&checkpoint)
            .random_node()?;

        let block = self.fetch_bundle(checkpoint.finalized.root, &upstream).await?;

        // Bundles must sit on an epoch boundary to be usable for checkpoint
        // sync; an upstream handing out anything else is violating the
        // contract.
        let slot = block.slot();
        let spec = self.spec()?;

        if !is_epoch_boundary(slot, spec.slots_per_epoch) {
            return Err(Error::MisalignedBundle { slot });
        }

        self.set_serving(checkpoint);

        info!(
            epoch = checkpoint.finalized.epoch,
            root = %checkpoint.finalized.root,
            "Serving a new finalized checkpoint bundle"
        );

        Ok(())
    }

    /// Fetches and caches the full bundle for a finalized block root: the
    /// block, in full mode its state, the epoch's deposit snapshot and, when
    /// Deneb is active, the slot's blob sidecars.
    ///
    /// Idempotent: artifacts that are already cached are not re-fetched.
    /// Failures are returned to the caller; no retries happen here.
    pub(crate) async fn fetch_bundle(
        &self,
        root: B256,
        upstream: &Arc<Node>,
    ) -> Result<Arc<VersionedSignedBeaconBlock>> {
        info!(upstream = upstream.name(), root = %root, "Fetching bundle");

        let block = match self.blocks.get_by_root(root) {
            Ok(block) => block,
            Err(_) => Arc::new(
                upstream
                    .client
                    .fetch_block(&root.to_string())
                    .await
                    .map_err(Error::Transport)?,
            ),
        };

        let block_root = self.encoder().block_root(&block)?;
        if block_root != root {
            return Err(Error::BundleMismatch);
        }

        let slot = block.slot();
        let state_root = block.state_root();

        info!(
            slot,
            root = %block_root,
            state_root = %state_root,
            "Fetched beacon block"
        );

        self.store_block(Arc::clone(&block))?;

        if self.should_download_states() && self.states.get_by_state_root(state_root).is_err() {
            let (version, ssz) = upstream
                .client
                .fetch_state_ssz(&state_root.to_string())
                .await
                .map_err(Error::Transport)?;

            let spec = self.spec()?;
            let version =
                version.unwrap_or_else(|| spec.fork_name_at_epoch(spec.epoch_at_slot(slot)));

            let state = VersionedBeaconState::from_ssz_bytes(version, ssz)
                .map_err(|err| Error::Transport(anyhow!("failed to decode state: {err:?}")))?;

            self.states.add(
                state_root,
                Arc::new(state),
                SystemTime::now() + FINALITY_HALTED_SERVING_PERIOD,
                slot,
            );
        }

        if slot != 0 {
            let epoch = self.spec()?.epoch_at_slot(slot);

            // A missing deposit snapshot degrades the bundle but does not
            // invalidate it.
            if let Err(err) = self.download_deposit_snapshot(epoch, upstream).await {
                warn!(
                    epoch,
                    error = %err,
                    "Failed to download deposit snapshot for bundle"
                );
            }
        }

        if self.spec()?.is_deneb_active_at_slot(slot)
            && self.get_blob_sidecars_by_slot(slot).is_err()
        {
            let sidecars = upstream
                .client
                .fetch_blob_sidecars(&slot.to_string())
                .await
                .map_err(Error::Transport)?;

            self.blob_sidecars.add(
                slot,
                Arc::new(sidecars),
                SystemTime::now() + FINALITY_HALTED_SERVING_PERIOD,
            );
        }

        info!(upstream = upstream.name(), "Successfully fetched bundle");

        Ok(block)
    }

    /// Fetches and stores the block at a slot. Requires genesis and the
    /// chain spec to be established so an expiry can be derived.
    pub(crate) async fn download_block(
        &self,
        slot: u64,
        upstream: &Arc<Node>,
    ) -> Result<Arc<VersionedSignedBeaconBlock>> {
        let genesis = self.genesis()?;
        let spec = self.spec()?;

        if let Ok(block) = self.blocks.get_by_slot(slot) {
            return Ok(block);
        }

        let block = Arc::new(
            upstream
                .client
                .fetch_block(&slot.to_string())
                .await
                .map_err(Error::Transport)?,
        );

        let expires_at = calculate_block_expiration(
            slot,
            spec.seconds_per_slot,
            genesis.genesis_time,
            HISTORICAL_BLOCK_RETENTION,
        );

        self.blocks.add(Arc::clone(&block), expires_at);

        info!(
            slot,
            root = %block.root(),
            state_root = %block.state_root(),
            "Downloaded and stored historical block"
        );

        Ok(block)
    }

    /// One historical backfill pass: downloads missing epoch-boundary blocks
    /// within scope, bounding per-slot failures and pacing fetches.
    /// Serialized by `historical_mutex`, which also owns the failure
    /// counters.
    pub(crate) async fn fetch_historical_checkpoints(&self, checkpoint: Finality) -> Result<()> {
        let mut failures = self.historical_mutex.lock().await;

        let spec = self.spec()?;

        let upstream = self
            .nodes
            .ready()
            .data_providers()
            .past_finalized_checkpoint(&checkpoint)
            .random_node()?;

        let scope = historical_slots_in_scope(
            checkpoint.finalized.epoch,
            spec.slots_per_epoch,
            self.config.historical_epoch_count,
        );

        for slot in &scope {
            let failure_count = failures.entry(*slot).or_insert(0);

            if *failure_count >= HISTORICAL_FAILURE_LIMIT {
                continue;
            }

            if self.blocks.get_by_slot(*slot).is_ok() {
                continue;
            }

            if let Err(err) = self.download_block(*slot, &upstream).await {
                *failure_count += 1;

                error!(
                    slot,
                    failure_count,
                    error = %err,
                    "Failed to download historical block"
                );

                if *failure_count == HISTORICAL_FAILURE_LIMIT {
                    error!(
                        slot,
                        "No longer attempting to download historical block, too many failures"
                    );
                }
            }

            tokio::time::sleep(HISTORICAL_FETCH_PAUSE).await;
        }

        // Drop counters for slots that fell out of scope so the map cannot
        // grow without bound.
        failures.retain(|slot, _| scope.contains(slot));

        Ok(())
    }

    fn store_block(&self, block: Arc<VersionedSignedBeaconBlock>) -> Result<()> {
        // Without the spec and genesis we cannot reason about epochs or
        // expiries yet.
        self.spec()?;
        self.genesis()?;

        if self.blocks.get_by_root(block.root()).is_ok() {
            return Ok(());
        }

        self.blocks
            .add(block, SystemTime::now() + FINALITY_HALTED_SERVING_PERIOD);

        Ok(())
    }

    async fn download_deposit_snapshot(&self, epoch: u64, upstream: &Arc<Node>) -> Result<()> {
        if self.get_deposit_snapshot(epoch).is_ok() {
            return Ok(());
        }

        let snapshot = upstream
            .client
            .fetch_deposit_snapshot()
            .await
            .map_err(Error::Transport)?;

        self.deposit_snapshots.add(
            epoch,
            Arc::new(snapshot),
            SystemTime::now() + DEPOSIT_SNAPSHOT_RETENTION,
        );

        info!(epoch, "Downloaded and stored deposit snapshot");

        Ok(())
    }
}
