use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{FixedVector, serde_utils::hex_fixed_vec, typenum};
use tree_hash_derive::TreeHash;

use crate::{
    beacon_block_header::SignedBeaconBlockHeader,
    bytes::{Blob, KZGCommitment, KZGProof},
};

/// A Deneb blob sidecar as served by `/eth/v1/beacon/blob_sidecars/{id}`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BlobSidecar {
    #[serde(with = "serde_utils::quoted_u64")]
    pub index: u64,
    #[serde(with = "hex_fixed_vec")]
    pub blob: Blob,
    pub kzg_commitment: KZGCommitment,
    pub kzg_proof: KZGProof,
    pub signed_block_header: SignedBeaconBlockHeader,
    pub kzg_commitment_inclusion_proof: FixedVector<B256, typenum::U17>,
}

impl BlobSidecar {
    pub fn slot(&self) -> u64 {
        self.signed_block_header.message.slot
    }
}
