use alloy_primitives::B256;
use ssz::{Decode, DecodeError, Encode};
use tree_hash::TreeHash;

use crate::{
    altair, beacon_block_header::SignedBeaconBlockHeader, bellatrix, capella, deneb, electra,
    fork::ForkName, phase0,
};

/// A signed beacon block tagged with the fork it was produced under.
///
/// The fork enum stays at this boundary; everything above it works through
/// `slot()`, `state_root()`, `root()` and the codec methods.
#[derive(Debug, PartialEq, Clone)]
pub enum VersionedSignedBeaconBlock {
    Phase0(phase0::SignedBeaconBlock),
    Altair(altair::SignedBeaconBlock),
    Bellatrix(bellatrix::SignedBeaconBlock),
    Capella(capella::SignedBeaconBlock),
    Deneb(deneb::SignedBeaconBlock),
    Electra(electra::SignedBeaconBlock),
    // Fulu did not change the block body.
    Fulu(electra::SignedBeaconBlock),
}

impl VersionedSignedBeaconBlock {
    pub fn version(&self) -> ForkName {
        match self {
            Self::Phase0(_) => ForkName::Phase0,
            Self::Altair(_) => ForkName::Altair,
            Self::Bellatrix(_) => ForkName::Bellatrix,
            Self::Capella(_) => ForkName::Capella,
            Self::Deneb(_) => ForkName::Deneb,
            Self::Electra(_) => ForkName::Electra,
            Self::Fulu(_) => ForkName::Fulu,
        }
    }

    pub fn slot(&self) -> u64 {
        match self {
            Self::Phase0(block) => block.message.slot,
            Self::Altair(block) => block.message.slot,
            Self::Bellatrix(block) => block.message.slot,
            Self::Capella(block) => block.message.slot,
            Self::Deneb(block) => block.message.slot,
            Self::Electra(block) | Self::Fulu(block) => block.message.slot,
        }
    }

    pub fn state_root(&self) -> B256 {
        match self {
            Self::Phase0(block) => block.message.state_root,
            Self::Altair(block) => block.message.state_root,
            Self::Bellatrix(block) => block.message.state_root,
            Self::Capella(block) => block.message.state_root,
            Self::Deneb(block) => block.message.state_root,
            Self::Electra(block) | Self::Fulu(block) => block.message.state_root,
        }
    }

    pub fn parent_root(&self) -> B256 {
        match self {
            Self::Phase0(block) => block.message.parent_root,
            Self::Altair(block) => block.message.parent_root,
            Self::Bellatrix(block) => block.message.parent_root,
            Self::Capella(block) => block.message.parent_root,
            Self::Deneb(block) => block.message.parent_root,
            Self::Electra(block) | Self::Fulu(block) => block.message.parent_root,
        }
    }

    /// Hash tree root of the block message, computed through the header
    /// identity (`body_root` collapses the fork-specific body).
    pub fn root(&self) -> B256 {
        self.block_header().tree_hash_root()
    }

    fn block_header(&self) -> crate::beacon_block_header::BeaconBlockHeader {
        match self {
            Self::Phase0(block) => block.block_header(),
            Self::Altair(block) => block.block_header(),
            Self::Bellatrix(block) => block.block_header(),
            Self::Capella(block) => block.block_header(),
            Self::Deneb(block) => block.block_header(),
            Self::Electra(block) | Self::Fulu(block) => block.block_header(),
        }
    }

    pub fn signed_block_header(&self) -> SignedBeaconBlockHeader {
        match self {
            Self::Phase0(block) => block.signed_block_header(),
            Self::Altair(block) => block.signed_block_header(),
            Self::Bellatrix(block) => block.signed_block_header(),
            Self::Capella(block) => block.signed_block_header(),
            Self::Deneb(block) => block.signed_block_header(),
            Self::Electra(block) | Self::Fulu(block) => block.signed_block_header(),
        }
    }

    pub fn from_json(
        version: ForkName,
        data: &serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match version {
            ForkName::Phase0 => Self::Phase0(serde_json::from_value(data.clone())?),
            ForkName::Altair => Self::Altair(serde_json::from_value(data.clone())?),
            ForkName::Bellatrix => Self::Bellatrix(serde_json::from_value(data.clone())?),
            ForkName::Capella => Self::Capella(serde_json::from_value(data.clone())?),
            ForkName::Deneb => Self::Deneb(serde_json::from_value(data.clone())?),
            ForkName::Electra => Self::Electra(serde_json::from_value(data.clone())?),
            ForkName::Fulu => Self::Fulu(serde_json::from_value(data.clone())?),
        })
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Phase0(block) => serde_json::to_value(block),
            Self::Altair(block) => serde_json::to_value(block),
            Self::Bellatrix(block) => serde_json::to_value(block),
            Self::Capella(block) => serde_json::to_value(block),
            Self::Deneb(block) => serde_json::to_value(block),
            Self::Electra(block) | Self::Fulu(block) => serde_json::to_value(block),
        }
    }

    pub fn from_ssz_bytes(version: ForkName, bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(match version {
            ForkName::Phase0 => Self::Phase0(phase0::SignedBeaconBlock::from_ssz_bytes(bytes)?),
            ForkName::Altair => Self::Altair(altair::SignedBeaconBlock::from_ssz_bytes(bytes)?),
            ForkName::Bellatrix => {
                Self::Bellatrix(bellatrix::SignedBeaconBlock::from_ssz_bytes(bytes)?)
            }
            ForkName::Capella => Self::Capella(capella::SignedBeaconBlock::from_ssz_bytes(bytes)?),
            ForkName::Deneb => Self::Deneb(deneb::SignedBeaconBlock::from_ssz_bytes(bytes)?),
            ForkName::Electra => Self::Electra(electra::SignedBeaconBlock::from_ssz_bytes(bytes)?),
            ForkName::Fulu => Self::Fulu(electra::SignedBeaconBlock::from_ssz_bytes(bytes)?),
        })
    }

    pub fn as_ssz_bytes(&self) -> Vec<u8> {
        match self {
            Self::Phase0(block) => block.as_ssz_bytes(),
            Self::Altair(block) => block.as_ssz_bytes(),
            Self::Bellatrix(block) => block.as_ssz_bytes(),
            Self::Capella(block) => block.as_ssz_bytes(),
            Self::Deneb(block) => block.as_ssz_bytes(),
            Self::Electra(block) | Self::Fulu(block) => block.as_ssz_bytes(),
        }
    }
}
