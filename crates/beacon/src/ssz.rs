use std::sync::Mutex;

use alloy_primitives::B256;
use anyhow::anyhow;
use checkpointz_consensus::{
    block::VersionedSignedBeaconBlock, spec::ChainSpec, state::VersionedBeaconState,
};

use crate::error::{Error, Result};

/// Version-dispatched codec facade for blocks and states.
///
/// The typed encode path targets the mainnet preset. When a re-fetched spec
/// announces a custom preset the flag flips and encodes start failing loudly
/// instead of producing bytes merkleized against the wrong list limits.
/// States are stored as raw SSZ and pass through unchanged for any preset.
pub struct Encoder {
    custom_preset: Mutex<bool>,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            custom_preset: Mutex::new(false),
        }
    }

    /// Rebinds the encoder to a (re-)fetched spec, dropping any previously
    /// derived codec state.
    pub fn set_spec(&self, spec: &ChainSpec) {
        *self.custom_preset.lock().expect("encoder lock poisoned") = spec.is_custom_preset();
    }

    fn ensure_mainnet_preset(&self) -> Result<()> {
        if *self.custom_preset.lock().expect("encoder lock poisoned") {
            return Err(Error::Transport(anyhow!(
                "custom presets are not supported by the typed SSZ path"
            )));
        }

        Ok(())
    }

    pub fn block_root(&self, block: &VersionedSignedBeaconBlock) -> Result<B256> {
        self.ensure_mainnet_preset()?;

        Ok(block.root())
    }

    pub fn encode_block_ssz(&self, block: &VersionedSignedBeaconBlock) -> Result<Vec<u8>> {
        self.ensure_mainnet_preset()?;

        Ok(block.as_ssz_bytes())
    }

    pub fn encode_block_json(&self, block: &VersionedSignedBeaconBlock) -> Result<serde_json::Value> {
        block
            .to_json()
            .map_err(|err| Error::Transport(anyhow!("failed to encode block: {err}")))
    }

    pub fn encode_state_ssz(&self, state: &VersionedBeaconState) -> Vec<u8> {
        state.as_ssz_bytes().to_vec()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
