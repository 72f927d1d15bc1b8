use std::{collections::BTreeMap, str::FromStr};

use alloy_primitives::{Address, aliases::B32};
use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    fork::ForkName,
    slot::{compute_epoch_at_slot, compute_start_slot_at_epoch},
};

pub const UNSCHEDULED_FORK_EPOCH: u64 = u64::MAX;
pub const MAINNET_PRESET: &str = "mainnet";

/// A named fork with its version and activation epoch, as advertised by an
/// upstream's `/eth/v1/config/spec`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledFork {
    pub name: String,
    pub version: B32,
    #[serde(with = "serde_utils::quoted_u64")]
    pub epoch: u64,
}

/// The subset of the chain spec the gateway consumes, plus the retained raw
/// key/value map for `/eth/v1/config/spec` passthrough.
///
/// `slots_per_epoch` and `seconds_per_slot` never change within a process
/// lifetime; re-fetched specs only pick up late-scheduled forks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    pub config_name: Option<String>,
    pub preset_base: String,
    pub slots_per_epoch: u64,
    pub seconds_per_slot: u64,
    pub deposit_chain_id: u64,
    pub deposit_network_id: u64,
    pub deposit_contract_address: Address,
    pub forks: Vec<ScheduledFork>,
    pub raw: BTreeMap<String, Value>,
}

fn parse_u64(raw: &BTreeMap<String, Value>, key: &str) -> anyhow::Result<u64> {
    let value = raw.get(key).ok_or_else(|| anyhow!("spec is missing {key}"))?;

    match value {
        Value::Number(number) => number
            .as_u64()
            .ok_or_else(|| anyhow!("spec field {key} is not a u64")),
        Value::String(string) => string
            .parse::<u64>()
            .with_context(|| format!("spec field {key} is not a u64")),
        _ => Err(anyhow!("spec field {key} has an unexpected type")),
    }
}

fn parse_string(raw: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

impl ChainSpec {
    pub fn from_raw(raw: BTreeMap<String, Value>) -> anyhow::Result<Self> {
        let deposit_contract_address = raw
            .get("DEPOSIT_CONTRACT_ADDRESS")
            .and_then(Value::as_str)
            .map(Address::from_str)
            .transpose()
            .context("spec field DEPOSIT_CONTRACT_ADDRESS is not an address")?
            .unwrap_or_default();

        let mut forks = Vec::new();

        if let Some(genesis_version) = parse_string(&raw, "GENESIS_FORK_VERSION") {
            forks.push(ScheduledFork {
                name: "PHASE0".to_string(),
                version: B32::from_str(&genesis_version)
                    .context("spec field GENESIS_FORK_VERSION is not a version")?,
                epoch: 0,
            });
        }

        for (key, _) in raw.iter() {
            let Some(name) = key.strip_suffix("_FORK_EPOCH") else {
                continue;
            };

            let epoch = parse_u64(&raw, key)?;
            let version = parse_string(&raw, &format!("{name}_FORK_VERSION"))
                .map(|version| B32::from_str(&version))
                .transpose()
                .with_context(|| format!("spec field {name}_FORK_VERSION is not a version"))?
                .unwrap_or_default();

            forks.push(ScheduledFork {
                name: name.to_string(),
                version,
                epoch,
            });
        }

        forks.sort_by_key(|fork| fork.epoch);

        Ok(Self {
            config_name: parse_string(&raw, "CONFIG_NAME"),
            preset_base: parse_string(&raw, "PRESET_BASE")
                .unwrap_or_else(|| MAINNET_PRESET.to_string()),
            slots_per_epoch: parse_u64(&raw, "SLOTS_PER_EPOCH")?,
            seconds_per_slot: parse_u64(&raw, "SECONDS_PER_SLOT")?,
            deposit_chain_id: parse_u64(&raw, "DEPOSIT_CHAIN_ID").unwrap_or_default(),
            deposit_network_id: parse_u64(&raw, "DEPOSIT_NETWORK_ID").unwrap_or_default(),
            deposit_contract_address,
            forks,
            raw,
        })
    }

    pub fn is_custom_preset(&self) -> bool {
        self.preset_base != MAINNET_PRESET
    }

    pub fn epoch_at_slot(&self, slot: u64) -> u64 {
        compute_epoch_at_slot(slot, self.slots_per_epoch)
    }

    pub fn start_slot_at_epoch(&self, epoch: u64) -> u64 {
        compute_start_slot_at_epoch(epoch, self.slots_per_epoch)
    }

    /// Activation epoch of a named fork, `None` when absent or unscheduled.
    pub fn fork_epoch(&self, name: &str) -> Option<u64> {
        self.forks
            .iter()
            .find(|fork| fork.name.eq_ignore_ascii_case(name))
            .map(|fork| fork.epoch)
            .filter(|epoch| *epoch != UNSCHEDULED_FORK_EPOCH)
    }

    pub fn is_deneb_active_at_slot(&self, slot: u64) -> bool {
        self.fork_epoch("DENEB")
            .is_some_and(|epoch| self.epoch_at_slot(slot) >= epoch)
    }

    /// The fork in force at the given epoch, derived from the schedule.
    pub fn fork_name_at_epoch(&self, epoch: u64) -> ForkName {
        let mut current = ForkName::Phase0;

        for fork in &self.forks {
            if fork.epoch == UNSCHEDULED_FORK_EPOCH || fork.epoch > epoch {
                continue;
            }

            if let Ok(name) = fork.name.to_lowercase().parse::<ForkName>() {
                if name > current {
                    current = name;
                }
            }
        }

        current
    }
}
