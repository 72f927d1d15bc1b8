use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Duration,
};

use alloy_primitives::B256;
use checkpointz_consensus::{
    blob_sidecar::BlobSidecar,
    block::VersionedSignedBeaconBlock,
    checkpoint::Finality,
    deposit_snapshot::DepositSnapshot,
    genesis::Genesis,
    networks::network_name_from_deposit_chain_id,
    slot::{SlotTime, calculate_slot_time},
    spec::ChainSpec,
    state::VersionedBeaconState,
};
use checkpointz_upstream::{Nodes, UpstreamConfig, wallclock};
use tokio::{
    sync::{Mutex, broadcast, mpsc, watch},
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::{Config, OperatingMode},
    error::{Error, Result},
    majority::MajorityDecider,
    metrics,
    ssz::Encoder,
    status::{Peer, SyncState, UpstreamStatus},
    store::{BlobSidecarStore, BlockStore, DepositSnapshotStore, StateStore},
};

/// How often the majority finality poll runs.
const FINALITY_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// How often the engine checks that a chain spec has been established.
const SPEC_CHECK_INTERVAL: Duration = Duration::from_secs(10);
/// How often every healthy upstream's finality view is forcibly refreshed.
const FINALITY_REFRESH_INTERVAL: Duration = Duration::from_secs(180);
/// How often the serving checkpoint transition is evaluated.
const SERVING_CHECK_INTERVAL: Duration = Duration::from_secs(5);
/// Extra pause after a failed serving transition before the next attempt.
const SERVING_FAILURE_BACKOFF: Duration = Duration::from_secs(15);
/// How often the historical backfill pass runs.
const HISTORICAL_CHECK_INTERVAL: Duration = Duration::from_secs(15);
/// How often the genesis bootstrap checks run.
const GENESIS_CHECK_INTERVAL: Duration = Duration::from_secs(15);

/// The finality aggregation and bundle-caching engine.
///
/// Owns the upstream pool and the object stores, maintains the `head` and
/// `serving` finality snapshots, and runs the periodic loops that keep them
/// converged. The HTTP layer only ever talks to this facade.
pub struct FinalityProvider {
    pub(crate) config: Config,
    pub(crate) nodes: Nodes,

    pub(crate) blocks: BlockStore,
    pub(crate) states: StateStore,
    pub(crate) deposit_snapshots: DepositSnapshotStore,
    pub(crate) blob_sidecars: BlobSidecarStore,
    encoder: Encoder,

    head: RwLock<Option<Finality>>,
    serving: RwLock<Option<Finality>>,
    spec: RwLock<Option<Arc<ChainSpec>>>,
    genesis: RwLock<Option<Genesis>>,

    /// Serializes serving checkpoint transitions (single flight).
    serving_mutex: Mutex<()>,
    /// Serializes majority decisions so updates publish in order.
    majority_mutex: Mutex<()>,
    /// Serializes spec refreshes and the encoder reset.
    spec_mutex: Mutex<()>,
    /// Serializes backfill passes and owns the per-slot failure counters.
    pub(crate) historical_mutex: Mutex<HashMap<u64, u32>>,

    head_updated: broadcast::Sender<Finality>,
}

impl FinalityProvider {
    pub fn new(config: Config, upstreams: Vec<UpstreamConfig>) -> anyhow::Result<Arc<Self>> {
        config.validate()?;

        if upstreams.is_empty() {
            anyhow::bail!("at least one upstream is required");
        }

        let (head_updated, _) = broadcast::channel(32);

        Ok(Arc::new(Self {
            nodes: Nodes::from_config(upstreams)?,
            blocks: BlockStore::new(config.caches.blocks),
            states: StateStore::new(config.caches.states),
            deposit_snapshots: DepositSnapshotStore::new(config.caches.deposit_snapshots),
            blob_sidecars: BlobSidecarStore::new(config.caches.blob_sidecars),
            encoder: Encoder::new(),
            head: RwLock::new(None),
            serving: RwLock::new(None),
            spec: RwLock::new(None),
            genesis: RwLock::new(None),
            serving_mutex: Mutex::new(()),
            majority_mutex: Mutex::new(()),
            spec_mutex: Mutex::new(()),
            historical_mutex: Mutex::new(HashMap::new()),
            head_updated,
            config,
        }))
    }

    /// Starts every background task. All tasks observe the shutdown channel
    /// and exit cleanly when it fires.
    pub fn start(self: &Arc<Self>, shutdown: watch::Receiver<bool>) {
        info!(
            mode = %self.operating_mode(),
            upstreams = self.nodes.len(),
            "Starting finality provider"
        );

        metrics::observe_operating_mode(self.operating_mode());

        self.blocks.start(shutdown.clone());
        self.states.start(shutdown.clone());
        self.deposit_snapshots.start(shutdown.clone());
        self.blob_sidecars.start(shutdown.clone());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.nodes.start_all(events_tx, shutdown.clone());

        self.spawn_upstream_event_loop(events_rx, shutdown.clone());
        self.spawn_head_updated_listener(shutdown.clone());
        self.spawn_finality_loop(shutdown.clone());
        self.spawn_finality_refresh_loop(shutdown.clone());
        self.spawn_spec_check_loop(shutdown.clone());
        self.spawn_epoch_spec_refresh_loop(shutdown.clone());
        self.spawn_serving_loop(shutdown.clone());
        self.spawn_historical_loop(shutdown.clone());
        self.spawn_genesis_loop(shutdown);
    }

    fn spawn_finality_loop(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let provider = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = interval(FINALITY_POLL_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = provider.check_finality().await {
                            debug!(error = %err, "Failed to check finality");
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    fn spawn_finality_refresh_loop(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let provider = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = interval(FINALITY_REFRESH_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        for node in provider.nodes.healthy().iter() {
                            if let Err(err) = node.refresh_finality().await {
                                debug!(
                                    upstream = node.name(),
                                    error = %err,
                                    "Failed to refresh finality when polling"
                                );
                            }
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    fn spawn_spec_check_loop(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let provider = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = interval(SPEC_CHECK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = provider.check_beacon_spec().await {
                            debug!(error = %err, "Failed to check beacon chain spec");
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    /// Re-fetches the spec on every epoch boundary once genesis and an
    /// initial spec are known, picking up late-scheduled fork activations.
    fn spawn_epoch_spec_refresh_loop(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let provider = Arc::clone(self);

        tokio::spawn(async move {
            let (genesis, spec) = loop {
                if let (Some(genesis), Ok(spec)) = (provider.genesis_snapshot(), provider.spec()) {
                    break (genesis, spec);
                }

                tokio::select! {
                    _ = tokio::time::sleep(GENESIS_CHECK_INTERVAL) => {}
                    _ = shutdown.changed() => return,
                }
            };

            let mut ticker = match wallclock::epoch_interval(
                genesis.genesis_time,
                spec.seconds_per_slot,
                spec.slots_per_epoch,
            ) {
                Ok(ticker) => ticker,
                Err(err) => {
                    error!(error = %err, "Failed to build epoch wallclock");
                    return;
                }
            };

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = provider.refresh_spec().await {
                            warn!(error = %err, "Failed to refresh spec on epoch boundary");
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    fn spawn_serving_loop(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let provider = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = interval(SERVING_CHECK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = provider.check_serving().await {
                            debug!(error = %err, "Failed to check for new serving checkpoint");

                            tokio::select! {
                                _ = tokio::time::sleep(SERVING_FAILURE_BACKOFF) => {}
                                _ = shutdown.changed() => break,
                            }
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    fn spawn_historical_loop(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let provider = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = interval(HISTORICAL_CHECK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(head) = provider.head_snapshot() else {
                            continue;
                        };

                        if let Err(err) = provider.fetch_historical_checkpoints(head).await {
                            debug!(error = %err, "Failed to fetch historical checkpoints");
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    fn spawn_genesis_loop(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let provider = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = interval(GENESIS_CHECK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = provider.check_genesis_time().await {
                            debug!(error = %err, "Failed to check genesis time");
                        }

                        if let Err(err) = provider.check_genesis().await {
                            debug!(error = %err, "Failed to check for genesis bundle");
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    /// Reacts to upstream `finalized_checkpoint` events: re-run the majority
    /// vote, then evaluate the serving transition.
    fn spawn_upstream_event_loop(
        self: &Arc<Self>,
        mut events: mpsc::UnboundedReceiver<String>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let provider = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => {
                        let Some(upstream) = event else { break };

                        info!(upstream, "Upstream has a new finalized checkpoint");

                        if let Err(err) = provider.check_finality().await {
                            debug!(error = %err, "Failed to check finality after upstream event");
                        }

                        if let Err(err) = provider.check_serving().await {
                            debug!(error = %err, "Failed to check serving checkpoint after upstream event");
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    /// The serving loop's event-driven half: every `head-updated` event
    /// triggers a serving evaluation immediately.
    fn spawn_head_updated_listener(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let provider = Arc::clone(self);
        let mut head_updated = self.head_updated.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = head_updated.recv() => {
                        if update.is_err() {
                            // Lagged receivers just catch up on the next event.
                            continue;
                        }

                        if let Err(err) = provider.check_serving().await {
                            debug!(error = %err, "Failed to check serving checkpoint after head update");
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    /// Collects the current finality triple from every ready upstream, runs
    /// the majority decider, and publishes `head-updated` when the head
    /// finalized root changes. Serialized by `majority_mutex`; the event is
    /// emitted with the mutex released.
    pub async fn check_finality(&self) -> Result<()> {
        let changed = {
            let _guard = self.majority_mutex.lock().await;

            let mut finalities = Vec::new();

            for node in self.nodes.ready().iter() {
                match node.refresh_finality().await {
                    Ok(finality) => finalities.push(finality),
                    Err(err) => {
                        info!(
                            upstream = node.name(),
                            error = %err,
                            "Failed to get finality from upstream"
                        );
                    }
                }
            }

            let majority = MajorityDecider::new().decide(&finalities)?;

            let head_changed = self
                .head_snapshot()
                .map(|head| head.finalized.root != majority.finalized.root)
                .unwrap_or(true);

            if head_changed {
                *self.head.write().expect("head lock poisoned") = Some(majority);

                info!(
                    epoch = majority.finalized.epoch,
                    root = %majority.finalized.root,
                    "New finalized head checkpoint"
                );

                metrics::observe_head_epoch(majority.finalized.epoch);
            }

            head_changed.then_some(majority)
        };

        if let Some(majority) = changed {
            let _ = self.head_updated.send(majority);
        }

        Ok(())
    }

    /// Brings `serving` in line with `head`, downloading the bundle for the
    /// head finalized checkpoint when they differ. Serialized by
    /// `serving_mutex`, so concurrent invocations observe the advanced state
    /// and exit cheaply.
    pub async fn check_serving(&self) -> Result<()> {
        let _guard = self.serving_mutex.lock().await;

        let head = self
            .head_snapshot()
            .ok_or(Error::NotReady("head finality is unknown"))?;

        if head.finalized.is_unknown() {
            return Err(Error::NotReady("head finalized checkpoint is unknown"));
        }

        if let Some(serving) = self.serving_snapshot() {
            if serving.finalized.epoch == head.finalized.epoch {
                return Ok(());
            }

            // The serving epoch never moves backwards within a process.
            if serving.finalized.epoch > head.finalized.epoch {
                warn!(
                    serving_epoch = serving.finalized.epoch,
                    head_epoch = head.finalized.epoch,
                    "Head finality is behind the serving checkpoint, refusing to downgrade"
                );

                return Ok(());
            }

            info!(
                head_epoch = head.finalized.epoch,
                head_root = %head.finalized.root,
                serving_epoch = serving.finalized.epoch,
                "Head finality has advanced, downloading new serving bundle"
            );
        } else {
            info!(
                head_epoch = head.finalized.epoch,
                head_root = %head.finalized.root,
                "No serving bundle available, downloading"
            );
        }

        self.download_serving_checkpoint(head).await
    }

    async fn check_beacon_spec(&self) -> Result<()> {
        if self.spec().is_ok() {
            return Ok(());
        }

        self.refresh_spec().await
    }

    pub(crate) async fn refresh_spec(&self) -> Result<()> {
        let _guard = self.spec_mutex.lock().await;

        debug!("Fetching beacon spec");

        let upstream = self.nodes.ready().data_providers().random_node()?;
        let fresh = upstream
            .client
            .fetch_spec()
            .await
            .map_err(Error::Transport)?;

        if let Ok(existing) = self.spec() {
            if existing.slots_per_epoch != fresh.slots_per_epoch
                || existing.seconds_per_slot != fresh.seconds_per_slot
            {
                warn!(
                    upstream = upstream.name(),
                    "Upstream returned a spec with different slot timing, ignoring it"
                );

                return Ok(());
            }
        }

        self.encoder.set_spec(&fresh);
        *self.spec.write().expect("spec lock poisoned") = Some(Arc::new(fresh));

        debug!("Fetched beacon spec");

        Ok(())
    }

    async fn check_genesis_time(&self) -> Result<()> {
        if self.genesis_snapshot().is_some() {
            return Ok(());
        }

        debug!("Fetching genesis time");

        let upstream = self.nodes.ready().data_providers().random_node()?;
        let genesis = upstream
            .client
            .fetch_genesis()
            .await
            .map_err(Error::Transport)?;

        *self.genesis.write().expect("genesis lock poisoned") = Some(genesis);

        info!(genesis_time = genesis.genesis_time, "Fetched genesis time");

        Ok(())
    }

    /// In full mode, makes sure the genesis block and state are stored. The
    /// stores pin slot-0 entries, and this check re-touches them on every
    /// pass so they are never considered stale.
    async fn check_genesis(&self) -> Result<()> {
        if !self.should_download_states() {
            return Ok(());
        }

        if let Ok(block) = self.blocks.get_by_slot(0) {
            if self.states.get_by_state_root(block.state_root()).is_ok() {
                return Ok(());
            }
        }

        debug!("Fetching genesis bundle");

        let ready = self.nodes.ready();
        if ready.is_empty() {
            return Err(Error::NoNodes);
        }

        let genesis_block = ready
            .random_node()?
            .client
            .fetch_block("genesis")
            .await
            .map_err(Error::Transport)?;

        let genesis_root = self.encoder.block_root(&genesis_block)?;

        let upstream = self.nodes.ready().data_providers().random_node()?;
        self.fetch_bundle(genesis_root, &upstream).await?;

        info!(root = %genesis_root, "Fetched genesis bundle");

        Ok(())
    }

    // Snapshots and facade reads.

    pub fn operating_mode(&self) -> OperatingMode {
        self.config.mode
    }

    pub fn frontend_config(&self) -> &crate::config::FrontendConfig {
        &self.config.frontend
    }

    pub(crate) fn should_download_states(&self) -> bool {
        self.config.mode == OperatingMode::Full
    }

    pub(crate) fn head_snapshot(&self) -> Option<Finality> {
        *self.head.read().expect("head lock poisoned")
    }

    pub(crate) fn serving_snapshot(&self) -> Option<Finality> {
        *self.serving.read().expect("serving lock poisoned")
    }

    pub(crate) fn set_serving(&self, checkpoint: Finality) {
        *self.serving.write().expect("serving lock poisoned") = Some(checkpoint);

        metrics::observe_serving_epoch(checkpoint.finalized.epoch);
    }

    pub(crate) fn genesis_snapshot(&self) -> Option<Genesis> {
        *self.genesis.read().expect("genesis lock poisoned")
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn healthy(&self) -> bool {
        !self.nodes.healthy().is_empty()
    }

    pub fn peers(&self) -> Vec<Peer> {
        self.nodes
            .iter()
            .map(|node| {
                let connected = node.status.healthy() && !node.status.syncing();

                Peer {
                    peer_id: node.name().to_string(),
                    state: if connected { "connected" } else { "disconnected" },
                    direction: "outbound",
                }
            })
            .collect()
    }

    pub fn peer_count(&self) -> u64 {
        self.nodes.healthy().not_syncing().len() as u64
    }

    pub fn syncing(&self) -> Result<SyncState> {
        let healthy = self.nodes.healthy();
        let is_syncing = healthy.syncing().len() == healthy.len();

        let spec = self.spec()?;

        let head_slot = self
            .head_snapshot()
            .map(|head| spec.start_slot_at_epoch(head.finalized.epoch))
            .unwrap_or(0);
        let serving_slot = self
            .serving_snapshot()
            .map(|serving| spec.start_slot_at_epoch(serving.finalized.epoch))
            .unwrap_or(0);

        Ok(SyncState {
            is_syncing,
            head_slot,
            sync_distance: head_slot.saturating_sub(serving_slot),
        })
    }

    pub fn head(&self) -> Result<Finality> {
        self.head_snapshot()
            .ok_or(Error::NotReady("head finality not yet available"))
    }

    /// The finality triple whose bundle is currently served to clients.
    pub fn finalized(&self) -> Result<Finality> {
        self.serving_snapshot()
            .ok_or(Error::NotReady("serving checkpoint not yet available"))
    }

    pub fn genesis(&self) -> Result<Genesis> {
        self.genesis_snapshot()
            .ok_or(Error::NotReady("genesis not yet available"))
    }

    pub fn spec(&self) -> Result<Arc<ChainSpec>> {
        self.spec
            .read()
            .expect("spec lock poisoned")
            .clone()
            .ok_or(Error::NotReady("chain spec not yet available"))
    }

    pub fn get_block_by_root(&self, root: B256) -> Result<Arc<VersionedSignedBeaconBlock>> {
        self.blocks.get_by_root(root)
    }

    pub fn get_block_by_slot(&self, slot: u64) -> Result<Arc<VersionedSignedBeaconBlock>> {
        self.blocks.get_by_slot(slot)
    }

    pub fn get_block_by_state_root(
        &self,
        state_root: B256,
    ) -> Result<Arc<VersionedSignedBeaconBlock>> {
        self.blocks.get_by_state_root(state_root)
    }

    pub fn get_state_by_state_root(&self, state_root: B256) -> Result<Arc<VersionedBeaconState>> {
        self.states.get_by_state_root(state_root)
    }

    pub fn get_state_by_slot(&self, slot: u64) -> Result<Arc<VersionedBeaconState>> {
        let block = self.get_block_by_slot(slot)?;

        self.states.get_by_state_root(block.state_root())
    }

    pub fn get_state_by_root(&self, root: B256) -> Result<Arc<VersionedBeaconState>> {
        let block = self.get_block_by_root(root)?;

        self.states.get_by_state_root(block.state_root())
    }

    pub fn get_blob_sidecars_by_slot(&self, slot: u64) -> Result<Arc<Vec<BlobSidecar>>> {
        self.blob_sidecars.get_by_slot(slot)
    }

    pub fn get_deposit_snapshot(&self, epoch: u64) -> Result<Arc<DepositSnapshot>> {
        self.deposit_snapshots.get_by_epoch(epoch)
    }

    /// The finalized epoch-boundary slots the engine aims to keep resident,
    /// newest first.
    pub fn list_finalized_slots(&self) -> Result<Vec<u64>> {
        let spec = self.spec()?;
        let head = self.head()?;

        let slots_per_epoch = spec.slots_per_epoch;
        let latest = spec.start_slot_at_epoch(head.finalized.epoch);
        let floor = latest.saturating_sub(slots_per_epoch * self.config.historical_epoch_count as u64);

        let mut slots = Vec::new();
        let mut slot = latest;

        while slot > floor {
            slots.push(slot);
            slot -= slots_per_epoch;
        }

        Ok(slots)
    }

    pub fn get_epoch_by_slot(&self, slot: u64) -> Result<u64> {
        Ok(self.spec()?.epoch_at_slot(slot))
    }

    pub fn get_slot_time(&self, slot: u64) -> Result<SlotTime> {
        let spec = self.spec()?;
        let genesis = self.genesis()?;

        Ok(calculate_slot_time(
            slot,
            genesis.genesis_time,
            spec.seconds_per_slot,
        ))
    }

    pub fn upstreams_status(&self) -> Vec<UpstreamStatus> {
        let network_name = self.spec().ok().map(|spec| {
            spec.config_name
                .clone()
                .unwrap_or_else(|| network_name_from_deposit_chain_id(spec.deposit_chain_id).to_string())
        });

        self.nodes
            .iter()
            .map(|node| UpstreamStatus {
                name: node.name().to_string(),
                healthy: node.status.healthy(),
                network_name: network_name.clone(),
                finality: node.finality(),
            })
            .collect()
    }

    /// Registers a callback invoked on its own task for every head update.
    /// Events are delivered in publication order.
    pub fn on_head_updated<F>(&self, callback: F)
    where
        F: Fn(Finality) + Send + 'static,
    {
        let mut receiver = self.head_updated.subscribe();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(finality) => callback(finality),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    pub fn subscribe_head_updated(&self) -> broadcast::Receiver<Finality> {
        self.head_updated.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        net::SocketAddr,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use checkpointz_consensus::{
        altair, bytes::BlsSignature, checkpoint::Checkpoint, eth1_data::Eth1Data,
        operations::SyncAggregate,
    };
    use serde_json::json;
    use ssz_types::BitVector;
    use warp::{Filter, Reply};

    use super::*;

    const SLOTS_PER_EPOCH: u64 = 32;

    struct FakeUpstream {
        finality: std::sync::RwLock<Finality>,
        blocks: std::sync::RwLock<HashMap<String, serde_json::Value>>,
        block_requests: AtomicUsize,
    }

    fn test_block(slot: u64) -> VersionedSignedBeaconBlock {
        VersionedSignedBeaconBlock::Altair(altair::SignedBeaconBlock {
            message: altair::BeaconBlock {
                slot,
                proposer_index: 1,
                parent_root: B256::repeat_byte(0xaa),
                state_root: B256::repeat_byte((slot % 251) as u8 + 1),
                body: altair::BeaconBlockBody {
                    randao_reveal: BlsSignature::default(),
                    eth1_data: Eth1Data {
                        deposit_root: B256::ZERO,
                        deposit_count: 0,
                        block_hash: B256::ZERO,
                    },
                    graffiti: B256::ZERO,
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
        })
    }

    fn finality_for(block: &VersionedSignedBeaconBlock) -> Finality {
        let justified = Checkpoint::new(
            block.slot() / SLOTS_PER_EPOCH + 1,
            B256::repeat_byte(0x22),
        );

        Finality {
            finalized: Checkpoint::new(block.slot() / SLOTS_PER_EPOCH, block.root()),
            current_justified: justified,
            previous_justified: justified,
        }
    }

    fn envelope(block: &VersionedSignedBeaconBlock) -> serde_json::Value {
        json!({
            "version": block.version().to_string(),
            "execution_optimistic": false,
            "finalized": true,
            "data": block.to_json().expect("block encodes"),
        })
    }

    fn zero_root() -> String {
        format!("0x{}", "00".repeat(32))
    }

    fn spawn_fake_upstream(state: Arc<FakeUpstream>) -> SocketAddr {
        let syncing = warp::path!("eth" / "v1" / "node" / "syncing").map(|| {
            warp::reply::json(&json!({
                "data": { "head_slot": "6400", "sync_distance": "0", "is_syncing": false }
            }))
        });

        let finality = {
            let state = Arc::clone(&state);

            warp::path!("eth" / "v1" / "beacon" / "states" / String / "finality_checkpoints")
                .map(move |_id: String| {
                    let finality = *state.finality.read().expect("finality lock poisoned");

                    warp::reply::json(&json!({ "data": finality }))
                })
        };

        let spec = warp::path!("eth" / "v1" / "config" / "spec").map(|| {
            warp::reply::json(&json!({
                "data": {
                    "CONFIG_NAME": "mainnet",
                    "PRESET_BASE": "mainnet",
                    "SLOTS_PER_EPOCH": "32",
                    "SECONDS_PER_SLOT": "12",
                    "DEPOSIT_CHAIN_ID": "1",
                    "DEPOSIT_NETWORK_ID": "1",
                    "DEPOSIT_CONTRACT_ADDRESS": "0x00000000219ab540356cbb839cbe05303d7705fa",
                    "GENESIS_FORK_VERSION": "0x00000000",
                    "ALTAIR_FORK_VERSION": "0x01000000",
                    "ALTAIR_FORK_EPOCH": "0",
                }
            }))
        });

        let genesis = warp::path!("eth" / "v1" / "beacon" / "genesis").map(move || {
            warp::reply::json(&json!({
                "data": {
                    "genesis_time": "1606824023",
                    "genesis_validators_root": zero_root(),
                    "genesis_fork_version": "0x00000000",
                }
            }))
        });

        let deposit_snapshot =
            warp::path!("eth" / "v1" / "beacon" / "deposit_snapshot").map(move || {
                warp::reply::json(&json!({
                    "data": {
                        "finalized": [],
                        "deposit_root": zero_root(),
                        "deposit_count": "0",
                        "execution_block_hash": zero_root(),
                        "execution_block_height": "0",
                    }
                }))
            });

        let blocks = {
            let state = Arc::clone(&state);

            warp::path!("eth" / "v2" / "beacon" / "blocks" / String).map(move |id: String| {
                state.block_requests.fetch_add(1, Ordering::SeqCst);

                match state.blocks.read().expect("blocks lock poisoned").get(&id) {
                    Some(envelope) => warp::reply::json(envelope).into_response(),
                    None => warp::reply::with_status(
                        warp::reply::json(&json!({ "message": "not found", "code": 404 })),
                        warp::http::StatusCode::NOT_FOUND,
                    )
                    .into_response(),
                }
            })
        };

        let routes = syncing
            .or(finality)
            .or(spec)
            .or(genesis)
            .or(deposit_snapshot)
            .or(blocks);

        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        addr
    }

    fn provider_for(addr: SocketAddr, historical_epoch_count: usize) -> Arc<FinalityProvider> {
        let config = Config {
            historical_epoch_count,
            ..Config::default()
        };

        FinalityProvider::new(
            config,
            vec![UpstreamConfig {
                name: "fake".to_string(),
                address: format!("http://{addr}"),
                data_provider: true,
                headers: Default::default(),
                timeout_seconds: 5,
            }],
        )
        .expect("valid provider config")
    }

    fn mark_ready(provider: &FinalityProvider) {
        for node in provider.nodes.iter() {
            node.status.observe_success(false, 6400);
            node.status.observe_success(false, 6400);
        }
    }

    async fn bootstrap(provider: &FinalityProvider) {
        provider.refresh_spec().await.expect("spec fetch");
        provider.check_genesis_time().await.expect("genesis fetch");
    }

    #[tokio::test]
    async fn test_serving_transition_and_idempotent_refetch() {
        let block = test_block(100 * SLOTS_PER_EPOCH);
        let state = Arc::new(FakeUpstream {
            finality: std::sync::RwLock::new(finality_for(&block)),
            blocks: std::sync::RwLock::new(HashMap::from([(
                block.root().to_string(),
                envelope(&block),
            )])),
            block_requests: AtomicUsize::new(0),
        });

        let provider = provider_for(spawn_fake_upstream(Arc::clone(&state)), 20);
        mark_ready(&provider);
        bootstrap(&provider).await;

        provider.check_finality().await.expect("majority exists");
        assert_eq!(provider.head().unwrap().finalized.epoch, 100);

        provider.check_serving().await.expect("serving transition");

        let serving = provider.finalized().unwrap();
        assert_eq!(serving.finalized.epoch, 100);

        let cached = provider.get_block_by_slot(100 * SLOTS_PER_EPOCH).unwrap();
        assert_eq!(cached.root(), block.root());
        assert_eq!(cached.slot() % SLOTS_PER_EPOCH, 0);

        // head == serving: another pass performs no further block fetches.
        let before = state.block_requests.load(Ordering::SeqCst);
        provider.check_serving().await.expect("no-op pass");
        assert_eq!(state.block_requests.load(Ordering::SeqCst), before);
    }

    #[tokio::test]
    async fn test_serving_epoch_advances_exactly_once_per_head_move() {
        let first = test_block(100 * SLOTS_PER_EPOCH);
        let state = Arc::new(FakeUpstream {
            finality: std::sync::RwLock::new(finality_for(&first)),
            blocks: std::sync::RwLock::new(HashMap::from([(
                first.root().to_string(),
                envelope(&first),
            )])),
            block_requests: AtomicUsize::new(0),
        });

        let provider = provider_for(spawn_fake_upstream(Arc::clone(&state)), 20);
        mark_ready(&provider);
        bootstrap(&provider).await;

        provider.check_finality().await.unwrap();
        provider.check_serving().await.unwrap();
        assert_eq!(provider.finalized().unwrap().finalized.epoch, 100);

        // The chain finalizes epoch 101.
        let second = test_block(101 * SLOTS_PER_EPOCH);
        *state.finality.write().unwrap() = finality_for(&second);
        state
            .blocks
            .write()
            .unwrap()
            .insert(second.root().to_string(), envelope(&second));

        provider.check_finality().await.unwrap();
        assert_eq!(provider.head().unwrap().finalized.epoch, 101);

        provider.check_serving().await.unwrap();
        assert_eq!(provider.finalized().unwrap().finalized.epoch, 101);
    }

    #[tokio::test]
    async fn test_bundle_root_mismatch_stores_nothing() {
        let block = test_block(100 * SLOTS_PER_EPOCH);
        let requested = B256::repeat_byte(0xbb);
        assert_ne!(requested, block.root());

        // The upstream answers the requested root with a different block.
        let state = Arc::new(FakeUpstream {
            finality: std::sync::RwLock::new(finality_for(&block)),
            blocks: std::sync::RwLock::new(HashMap::from([(
                requested.to_string(),
                envelope(&block),
            )])),
            block_requests: AtomicUsize::new(0),
        });

        let provider = provider_for(spawn_fake_upstream(Arc::clone(&state)), 20);
        mark_ready(&provider);
        bootstrap(&provider).await;

        let upstream = provider.nodes.iter().next().unwrap().clone();

        let result = provider.fetch_bundle(requested, &upstream).await;
        assert!(matches!(result, Err(Error::BundleMismatch)));

        assert!(provider.get_block_by_root(block.root()).is_err());
        assert!(provider.finalized().is_err(), "serving must be untouched");
    }

    #[tokio::test]
    async fn test_misaligned_bundle_is_rejected() {
        let misaligned = test_block(100 * SLOTS_PER_EPOCH + 1);
        let state = Arc::new(FakeUpstream {
            finality: std::sync::RwLock::new(finality_for(&misaligned)),
            blocks: std::sync::RwLock::new(HashMap::from([(
                misaligned.root().to_string(),
                envelope(&misaligned),
            )])),
            block_requests: AtomicUsize::new(0),
        });

        let provider = provider_for(spawn_fake_upstream(Arc::clone(&state)), 20);
        mark_ready(&provider);
        bootstrap(&provider).await;

        provider.check_finality().await.unwrap();

        let result = provider.check_serving().await;
        assert!(matches!(result, Err(Error::MisalignedBundle { slot }) if slot % SLOTS_PER_EPOCH == 1));
        assert!(provider.finalized().is_err(), "serving must be untouched");
    }

    #[tokio::test]
    async fn test_backfill_failures_are_capped_and_pruned() {
        // No blocks at all: every historical download fails.
        let head = Finality {
            finalized: Checkpoint::new(100, B256::repeat_byte(0x11)),
            current_justified: Checkpoint::new(101, B256::repeat_byte(0x22)),
            previous_justified: Checkpoint::new(101, B256::repeat_byte(0x22)),
        };

        let state = Arc::new(FakeUpstream {
            finality: std::sync::RwLock::new(head),
            blocks: std::sync::RwLock::new(HashMap::new()),
            block_requests: AtomicUsize::new(0),
        });

        let provider = provider_for(spawn_fake_upstream(Arc::clone(&state)), 2);
        mark_ready(&provider);
        bootstrap(&provider).await;
        provider.check_finality().await.unwrap();

        // Scope is {0, 3168}; five passes exhaust the failure limit.
        for _ in 0..5 {
            provider.fetch_historical_checkpoints(head).await.unwrap();
        }
        assert_eq!(state.block_requests.load(Ordering::SeqCst), 10);

        // A sixth pass skips both slots entirely.
        provider.fetch_historical_checkpoints(head).await.unwrap();
        assert_eq!(state.block_requests.load(Ordering::SeqCst), 10);

        // The head moves on; the stale slot's counter is pruned.
        let new_head = Finality {
            finalized: Checkpoint::new(102, B256::repeat_byte(0x33)),
            ..head
        };
        *state.finality.write().unwrap() = new_head;

        let upstream = provider.nodes.iter().next().unwrap().clone();
        upstream.refresh_finality().await.unwrap();

        provider.fetch_historical_checkpoints(new_head).await.unwrap();

        let failures = provider.historical_mutex.lock().await;
        assert!(!failures.contains_key(&(99 * SLOTS_PER_EPOCH)));
        assert!(failures.contains_key(&(101 * SLOTS_PER_EPOCH)));
    }
}
