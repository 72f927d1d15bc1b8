use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_timeout_seconds() -> u64 {
    30
}

/// Configuration for a single upstream beacon node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Human-friendly name, used in logs and the status endpoint.
    pub name: String,
    /// Base address of the upstream's Beacon HTTP API.
    pub address: String,
    /// Whether this upstream may serve block/state payloads, or only votes
    /// on finality.
    #[serde(default)]
    pub data_provider: bool,
    /// Extra headers attached to every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Per-request deadline.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl UpstreamConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("upstream name is required");
        }

        if self.address.is_empty() {
            anyhow::bail!("upstream {} has no address", self.name);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: UpstreamConfig = serde_json::from_str(
            r#"{"name": "local", "address": "http://localhost:5052"}"#,
        )
        .unwrap();

        assert_eq!(config.timeout_seconds, 30);
        assert!(!config.data_provider);
        assert!(config.headers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_address_is_invalid() {
        let config: UpstreamConfig =
            serde_json::from_str(r#"{"name": "local", "address": ""}"#).unwrap();

        assert!(config.validate().is_err());
    }
}
