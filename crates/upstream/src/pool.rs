use std::sync::Arc;

use checkpointz_consensus::checkpoint::Finality;
use rand::seq::IndexedRandom;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::{agent::Agent, config::UpstreamConfig, node::Node};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("no nodes found")]
    NoNodes,
}

/// The set of configured upstreams.
///
/// Filters return a fresh `Nodes` over the same shared handles, so chains
/// like `nodes.ready().data_providers().random_node()` never mutate the pool.
#[derive(Clone, Default)]
pub struct Nodes(Vec<Arc<Node>>);

impl Nodes {
    pub fn from_config(configs: Vec<UpstreamConfig>) -> anyhow::Result<Self> {
        let nodes = configs
            .into_iter()
            .map(|config| Node::new(config).map(Arc::new))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self(nodes))
    }

    /// Starts every node's background tasks.
    pub fn start_all(
        &self,
        events: mpsc::UnboundedSender<String>,
        shutdown: watch::Receiver<bool>,
    ) {
        for node in &self.0 {
            node.start(events.clone(), shutdown.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn filter(&self, predicate: impl Fn(&Node) -> bool) -> Nodes {
        Nodes(
            self.0
                .iter()
                .filter(|node| predicate(node))
                .cloned()
                .collect(),
        )
    }

    pub fn healthy(&self) -> Nodes {
        self.filter(|node| node.status.healthy())
    }

    pub fn syncing(&self) -> Nodes {
        self.filter(|node| node.status.syncing())
    }

    pub fn not_syncing(&self) -> Nodes {
        self.filter(|node| !node.status.syncing())
    }

    pub fn ready(&self) -> Nodes {
        self.healthy().not_syncing()
    }

    pub fn data_providers(&self) -> Nodes {
        self.filter(|node| node.config.data_provider)
    }

    /// Keeps upstreams whose last-known finalized epoch is at least the
    /// checkpoint's, i.e. nodes that can serve data for it.
    pub fn past_finalized_checkpoint(&self, checkpoint: &Finality) -> Nodes {
        self.filter(|node| match node.finality() {
            Some(finality) => finality.finalized.epoch >= checkpoint.finalized.epoch,
            None => false,
        })
    }

    pub fn agents(&self, agents: &[Agent]) -> Nodes {
        self.filter(|node| agents.contains(&node.agent()))
    }

    pub fn random_node(&self) -> Result<Arc<Node>, PoolError> {
        self.0
            .choose(&mut rand::rng())
            .cloned()
            .ok_or(PoolError::NoNodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_nodes(count: usize, data_providers: usize) -> Nodes {
        let configs = (0..count)
            .map(|index| UpstreamConfig {
                name: format!("node-{index}"),
                address: format!("http://localhost:{}", 5052 + index),
                data_provider: index < data_providers,
                headers: Default::default(),
                timeout_seconds: 30,
            })
            .collect();

        Nodes::from_config(configs).expect("valid configs")
    }

    #[test]
    fn test_random_node_on_empty_set() {
        assert_eq!(Nodes::default().random_node().unwrap_err(), PoolError::NoNodes);
    }

    #[test]
    fn test_data_provider_filter() {
        let nodes = test_nodes(3, 1);

        assert_eq!(nodes.data_providers().len(), 1);
        assert_eq!(nodes.data_providers().random_node().unwrap().name(), "node-0");
    }

    #[test]
    fn test_unprobed_nodes_are_not_healthy() {
        let nodes = test_nodes(2, 0);

        assert!(nodes.healthy().is_empty());
        assert!(nodes.ready().is_empty());
    }

    #[test]
    fn test_ready_excludes_syncing_nodes() {
        let nodes = test_nodes(3, 0);

        for node in nodes.iter() {
            node.status.observe_success(false, 100);
            node.status.observe_success(false, 101);
        }

        let syncing = nodes.iter().next().unwrap();
        syncing.status.observe_success(true, 102);

        assert_eq!(nodes.healthy().len(), 3);
        assert_eq!(nodes.ready().len(), 2);
        assert_eq!(nodes.syncing().len(), 1);
    }

    #[test]
    fn test_past_finalized_checkpoint_requires_known_finality() {
        use alloy_primitives::B256;
        use checkpointz_consensus::checkpoint::Checkpoint;

        let nodes = test_nodes(1, 0);
        let target = Finality {
            finalized: Checkpoint::new(100, B256::repeat_byte(1)),
            ..Default::default()
        };

        // No finality observed yet.
        assert!(nodes.past_finalized_checkpoint(&target).is_empty());
    }

    #[test]
    fn test_filters_do_not_mutate_the_pool() {
        let nodes = test_nodes(3, 1);

        let _ = nodes.data_providers();
        assert_eq!(nodes.len(), 3);
    }
}
