use std::{sync::Arc, time::Duration};

use alloy_primitives::B256;
use eventsource_client::{Client, ClientBuilder, SSE};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::node::Node;

const FINALIZED_CHECKPOINT_TOPIC: &str = "finalized_checkpoint";
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Payload of the `finalized_checkpoint` SSE topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizedCheckpointEvent {
    pub block: B256,
    pub state: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub epoch: u64,
    #[serde(default)]
    pub execution_optimistic: bool,
}

/// Subscribes to the upstream's `finalized_checkpoint` events and forwards
/// the node's name to the engine on every event. The connection is retried
/// forever with a fixed delay; the task exits on shutdown.
pub fn spawn(
    node: Arc<Node>,
    events: mpsc::UnboundedSender<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = subscribe_once(&node, &events) => {
                    tokio::select! {
                        _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                        _ = shutdown.changed() => break,
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
    });
}

async fn subscribe_once(node: &Node, events: &mpsc::UnboundedSender<String>) {
    let url = match node.client.events_url(FINALIZED_CHECKPOINT_TOPIC) {
        Ok(url) => url,
        Err(err) => {
            warn!(upstream = node.name(), error = %err, "Invalid events URL");
            return;
        }
    };

    let client = match ClientBuilder::for_url(url.as_str()) {
        Ok(builder) => builder.build(),
        Err(err) => {
            warn!(upstream = node.name(), error = %err, "Failed to build event source client");
            return;
        }
    };

    let mut stream = client.stream();

    while let Some(event) = stream.next().await {
        match event {
            Ok(SSE::Event(event)) if event.event_type == FINALIZED_CHECKPOINT_TOPIC => {
                match serde_json::from_str::<FinalizedCheckpointEvent>(&event.data) {
                    Ok(checkpoint) => {
                        debug!(
                            upstream = node.name(),
                            epoch = checkpoint.epoch,
                            block = %checkpoint.block,
                            "Upstream reported a new finalized checkpoint"
                        );

                        // Refresh the node's view before notifying the engine
                        // so the majority poll sees the new triple.
                        if let Err(err) = node.refresh_finality().await {
                            warn!(
                                upstream = node.name(),
                                error = %err,
                                "Failed to refresh finality after checkpoint event"
                            );
                        }

                        if events.send(node.name().to_string()).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!(upstream = node.name(), error = %err, "Failed to decode finalized checkpoint event");
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                debug!(upstream = node.name(), error = %err, "Event stream error, reconnecting");
                return;
            }
        }
    }
}
