use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use checkpointz_consensus::checkpoint::Finality;
use tokio::{
    sync::{mpsc, watch},
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

use crate::{
    agent::Agent,
    client::BeaconApiClient,
    config::UpstreamConfig,
    health::{PROBE_INTERVAL_SECONDS, Status},
    subscription,
};

/// A single configured upstream: its config, API client, probed health and
/// the finality triple it last reported.
#[derive(Debug)]
pub struct Node {
    pub config: UpstreamConfig,
    pub client: BeaconApiClient,
    pub status: Status,
    finality: RwLock<Option<Finality>>,
    node_version: RwLock<Option<String>>,
}

impl Node {
    pub fn new(config: UpstreamConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let client = BeaconApiClient::new(
            &config.address,
            &config.headers,
            Duration::from_secs(config.timeout_seconds),
        )?;

        Ok(Self {
            config,
            client,
            status: Status::new(),
            finality: RwLock::new(None),
            node_version: RwLock::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The last finality triple this upstream reported, if any.
    pub fn finality(&self) -> Option<Finality> {
        *self.finality.read().expect("finality lock poisoned")
    }

    pub fn node_version(&self) -> Option<String> {
        self.node_version
            .read()
            .expect("node version lock poisoned")
            .clone()
    }

    pub fn agent(&self) -> Agent {
        self.node_version()
            .map(|version| Agent::from_node_version(&version))
            .unwrap_or(Agent::Unknown)
    }

    /// Fetches the upstream's head finality and records it as the node's
    /// last-known value.
    pub async fn refresh_finality(&self) -> anyhow::Result<Finality> {
        let finality = self.client.fetch_finality("head").await?;

        *self.finality.write().expect("finality lock poisoned") = Some(finality);

        Ok(finality)
    }

    /// Spawns the per-upstream background tasks: the health probe and the
    /// `finalized_checkpoint` event subscription. Events are forwarded to
    /// the engine as the node's name.
    pub fn start(
        self: &Arc<Self>,
        events: mpsc::UnboundedSender<String>,
        shutdown: watch::Receiver<bool>,
    ) {
        self.spawn_health_probe(shutdown.clone());

        subscription::spawn(Arc::clone(self), events, shutdown);
    }

    fn spawn_health_probe(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let node = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(PROBE_INTERVAL_SECONDS));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => node.probe().await,
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    async fn probe(&self) {
        match self.client.fetch_syncing().await {
            Ok(syncing) => {
                self.status
                    .observe_success(syncing.is_syncing, syncing.head_slot);

                debug!(
                    upstream = self.name(),
                    head_slot = syncing.head_slot,
                    is_syncing = syncing.is_syncing,
                    "Upstream health probe succeeded"
                );
            }
            Err(err) => {
                self.status.observe_failure();

                warn!(upstream = self.name(), error = %err, "Upstream health probe failed");
            }
        }

        if self.node_version().is_none() {
            if let Ok(version) = self.client.fetch_node_version().await {
                *self
                    .node_version
                    .write()
                    .expect("node version lock poisoned") = Some(version);
            }
        }
    }
}
