use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{VariableList, typenum};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use crate::{
    beacon_block_header::{BeaconBlockHeader, SignedBeaconBlockHeader},
    bytes::{BlsSignature, KZGCommitment},
    eth1_data::Eth1Data,
    execution_payload::ExecutionPayloadDeneb,
    operations::{
        Attestation, AttesterSlashing, Deposit, ProposerSlashing, SignedBlsToExecutionChange,
        SignedVoluntaryExit, SyncAggregate,
    },
};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconBlockBody {
    pub randao_reveal: BlsSignature,
    pub eth1_data: Eth1Data,
    pub graffiti: B256,
    pub proposer_slashings: VariableList<ProposerSlashing, typenum::U16>,
    pub attester_slashings: VariableList<AttesterSlashing, typenum::U2>,
    pub attestations: VariableList<Attestation, typenum::U128>,
    pub deposits: VariableList<Deposit, typenum::U16>,
    pub voluntary_exits: VariableList<SignedVoluntaryExit, typenum::U16>,
    pub sync_aggregate: SyncAggregate,
    pub execution_payload: ExecutionPayloadDeneb,
    pub bls_to_execution_changes: VariableList<SignedBlsToExecutionChange, typenum::U16>,
    pub blob_kzg_commitments: VariableList<KZGCommitment, typenum::U4096>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconBlock {
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub proposer_index: u64,
    pub parent_root: B256,
    pub state_root: B256,
    pub body: BeaconBlockBody,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct SignedBeaconBlock {
    pub message: BeaconBlock,
    pub signature: BlsSignature,
}

impl SignedBeaconBlock {
    pub fn block_header(&self) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot: self.message.slot,
            proposer_index: self.message.proposer_index,
            parent_root: self.message.parent_root,
            state_root: self.message.state_root,
            body_root: self.message.body.tree_hash_root(),
        }
    }

    pub fn signed_block_header(&self) -> SignedBeaconBlockHeader {
        SignedBeaconBlockHeader {
            message: self.block_header(),
            signature: self.signature,
        }
    }
}
