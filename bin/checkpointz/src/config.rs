use std::{fs, net::SocketAddr, path::Path};

use anyhow::Context;
use checkpointz_beacon::Config as CheckpointzConfig;
use checkpointz_upstream::UpstreamConfig;
use serde::{Deserialize, Serialize};

fn default_listen_addr() -> String {
    "0.0.0.0:5555".to_string()
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            metrics_addr: default_metrics_addr(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconConfig {
    pub upstreams: Vec<UpstreamConfig>,
}

/// The full application configuration as loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    pub beacon: BeaconConfig,
    #[serde(default)]
    pub checkpointz: CheckpointzConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.listen_addr()?;
        self.metrics_addr()?;

        if self.beacon.upstreams.is_empty() {
            anyhow::bail!("at least one beacon upstream is required");
        }

        for upstream in &self.beacon.upstreams {
            upstream.validate()?;
        }

        self.checkpointz.validate()
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.global
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen_addr: {}", self.global.listen_addr))
    }

    pub fn metrics_addr(&self) -> anyhow::Result<SocketAddr> {
        self.global
            .metrics_addr
            .parse()
            .with_context(|| format!("invalid metrics_addr: {}", self.global.metrics_addr))
    }
}

#[cfg(test)]
mod tests {
    use checkpointz_beacon::OperatingMode;

    use super::*;

    const EXAMPLE: &str = r#"
global:
  listen_addr: "0.0.0.0:5555"
  log_level: debug
beacon:
  upstreams:
    - name: remote
      address: http://localhost:5052
      data_provider: true
checkpointz:
  mode: full
  historical_epoch_count: 10
  caches:
    blocks:
      max_items: 20
"#;

    #[test]
    fn test_parses_example_config() {
        let config: AppConfig = serde_yaml::from_str(EXAMPLE).unwrap();

        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.global.metrics_addr, "0.0.0.0:9090");
        assert_eq!(config.beacon.upstreams.len(), 1);
        assert!(config.beacon.upstreams[0].data_provider);
        assert_eq!(config.checkpointz.mode, OperatingMode::Full);
        assert_eq!(config.checkpointz.historical_epoch_count, 10);
        assert_eq!(config.checkpointz.caches.blocks.max_items, 20);
        // Unset cache sections keep their defaults.
        assert_eq!(config.checkpointz.caches.states.max_items, 5);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_upstreams_are_required() {
        let config: AppConfig = serde_yaml::from_str(
            r#"
beacon:
  upstreams: []
"#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_listen_addr_is_rejected() {
        let mut config: AppConfig = serde_yaml::from_str(EXAMPLE).unwrap();
        config.global.listen_addr = ":5555".to_string();

        assert!(config.validate().is_err());
    }
}
