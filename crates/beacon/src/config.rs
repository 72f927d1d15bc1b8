use std::fmt;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Whether the instance serves full bundles (blocks and states) or only
/// participates in finality aggregation and block serving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    Full,
    #[default]
    Light,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Full => write!(f, "full"),
            OperatingMode::Light => write!(f, "light"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub max_items: usize,
}

impl StoreConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_items < 1 {
            bail!("max_items must be at least 1");
        }

        Ok(())
    }
}

fn default_blocks() -> StoreConfig {
    StoreConfig { max_items: 30 }
}

fn default_states() -> StoreConfig {
    StoreConfig { max_items: 5 }
}

fn default_deposit_snapshots() -> StoreConfig {
    StoreConfig { max_items: 30 }
}

fn default_blob_sidecars() -> StoreConfig {
    StoreConfig { max_items: 30 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_blocks")]
    pub blocks: StoreConfig,
    #[serde(default = "default_states")]
    pub states: StoreConfig,
    #[serde(default = "default_deposit_snapshots")]
    pub deposit_snapshots: StoreConfig,
    #[serde(default = "default_blob_sidecars")]
    pub blob_sidecars: StoreConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            blocks: default_blocks(),
            states: default_states(),
            deposit_snapshots: default_deposit_snapshots(),
            blob_sidecars: default_blob_sidecars(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, store) in [
            ("blocks", &self.blocks),
            ("states", &self.states),
            ("deposit_snapshots", &self.deposit_snapshots),
            ("blob_sidecars", &self.blob_sidecars),
        ] {
            store.validate()?;

            if store.max_items < 3 {
                bail!("{name}.max_items must be at least 3");
            }
        }

        Ok(())
    }
}

fn default_frontend_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendConfig {
    #[serde(default = "default_frontend_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub public_url: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub brand_image_url: String,
}

fn default_historical_epoch_count() -> usize {
    20
}

/// Configuration for the finality provider engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: OperatingMode,
    #[serde(default)]
    pub caches: CacheConfig,
    /// How many historical epoch boundaries the engine keeps resident.
    #[serde(default = "default_historical_epoch_count")]
    pub historical_epoch_count: usize,
    #[serde(default)]
    pub frontend: FrontendConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: OperatingMode::default(),
            caches: CacheConfig::default(),
            historical_epoch_count: default_historical_epoch_count(),
            frontend: FrontendConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.historical_epoch_count < 1 {
            bail!("historical_epoch_count must be at least 1");
        }

        if self.historical_epoch_count > 200 {
            bail!(
                "historical_epoch_count ({}) cannot be higher than 200",
                self.historical_epoch_count
            );
        }

        self.caches.validate()?;

        if self.historical_epoch_count >= self.caches.blocks.max_items {
            bail!(
                "historical_epoch_count ({}) must be less than caches.blocks.max_items ({})",
                self.historical_epoch_count,
                self.caches.blocks.max_items
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
        assert_eq!(Config::default().mode, OperatingMode::Light);
        assert_eq!(Config::default().caches.blocks.max_items, 30);
        assert_eq!(Config::default().caches.states.max_items, 5);
    }

    #[test]
    fn test_historical_epoch_count_bounds() {
        let mut config = Config::default();

        config.historical_epoch_count = 0;
        assert!(config.validate().is_err());

        config.historical_epoch_count = 201;
        assert!(config.validate().is_err());

        config.historical_epoch_count = 30;
        // Equal to blocks.max_items is rejected, it must be strictly less.
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_small_caches_are_rejected() {
        let mut config = Config::default();
        config.caches.states.max_items = 2;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mode_parses_from_yaml_names() {
        let config: Config = serde_json::from_str(r#"{"mode": "full"}"#).unwrap();

        assert_eq!(config.mode, OperatingMode::Full);
    }
}
