use std::{collections::BTreeMap, str::FromStr, time::Duration};

use anyhow::{Context, anyhow};
use checkpointz_consensus::{
    blob_sidecar::BlobSidecar, block::VersionedSignedBeaconBlock, checkpoint::Finality,
    deposit_snapshot::DepositSnapshot, fork::ForkName, genesis::Genesis, spec::ChainSpec,
};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderName, HeaderValue},
};
use serde::Deserialize;
use url::Url;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const SSZ_CONTENT_TYPE: &str = "application/octet-stream";
pub const ETH_CONSENSUS_VERSION_HEADER: &str = "Eth-Consensus-Version";

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct VersionedEnvelope {
    version: String,
    data: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncingStatus {
    #[serde(with = "serde_utils::quoted_u64")]
    pub head_slot: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub sync_distance: u64,
    pub is_syncing: bool,
}

/// A thin wrapper over one upstream's Beacon HTTP API.
///
/// Every call carries the configured per-request deadline; failures surface
/// as `anyhow` errors for the engine to classify as transport errors.
#[derive(Debug)]
pub struct BeaconApiClient {
    client: Client,
    base_url: Url,
}

impl BeaconApiClient {
    pub fn new(
        address: &str,
        headers: &std::collections::HashMap<String, String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(address.trim_end_matches('/'))
            .with_context(|| format!("invalid upstream address: {address}"))?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in headers {
            default_headers.insert(
                HeaderName::from_str(name).with_context(|| format!("invalid header: {name}"))?,
                HeaderValue::from_str(value)
                    .with_context(|| format!("invalid header value for {name}"))?,
            );
        }

        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .default_headers(default_headers)
                .build()?,
            base_url,
        })
    }

    pub async fn fetch_block(&self, block_id: &str) -> anyhow::Result<VersionedSignedBeaconBlock> {
        let endpoint = self
            .base_url
            .join(&format!("/eth/v2/beacon/blocks/{block_id}"))?;

        let response = self
            .client
            .get(endpoint)
            .header(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(anyhow!("block {block_id} not found"));
        }

        let envelope = response
            .error_for_status()?
            .json::<VersionedEnvelope>()
            .await?;

        let version = envelope
            .version
            .parse::<ForkName>()
            .context("upstream returned an unknown block version")?;

        Ok(VersionedSignedBeaconBlock::from_json(version, &envelope.data)?)
    }

    /// Fetches a state as raw SSZ. The fork is taken from the
    /// `Eth-Consensus-Version` response header when present.
    pub async fn fetch_state_ssz(
        &self,
        state_id: &str,
    ) -> anyhow::Result<(Option<ForkName>, Vec<u8>)> {
        let endpoint = self
            .base_url
            .join(&format!("/eth/v2/debug/beacon/states/{state_id}"))?;

        let response = self
            .client
            .get(endpoint)
            .header(ACCEPT, HeaderValue::from_static(SSZ_CONTENT_TYPE))
            .send()
            .await?
            .error_for_status()?;

        let version = response
            .headers()
            .get(ETH_CONSENSUS_VERSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<ForkName>().ok());

        Ok((version, response.bytes().await?.to_vec()))
    }

    pub async fn fetch_finality(&self, state_id: &str) -> anyhow::Result<Finality> {
        let endpoint = self
            .base_url
            .join(&format!("/eth/v1/beacon/states/{state_id}/finality_checkpoints"))?;

        Ok(self
            .client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<DataEnvelope<Finality>>()
            .await?
            .data)
    }

    pub async fn fetch_spec(&self) -> anyhow::Result<ChainSpec> {
        let endpoint = self.base_url.join("/eth/v1/config/spec")?;

        let raw = self
            .client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<DataEnvelope<BTreeMap<String, serde_json::Value>>>()
            .await?
            .data;

        ChainSpec::from_raw(raw)
    }

    pub async fn fetch_genesis(&self) -> anyhow::Result<Genesis> {
        let endpoint = self.base_url.join("/eth/v1/beacon/genesis")?;

        Ok(self
            .client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<DataEnvelope<Genesis>>()
            .await?
            .data)
    }

    pub async fn fetch_deposit_snapshot(&self) -> anyhow::Result<DepositSnapshot> {
        let endpoint = self.base_url.join("/eth/v1/beacon/deposit_snapshot")?;

        Ok(self
            .client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<DataEnvelope<DepositSnapshot>>()
            .await?
            .data)
    }

    pub async fn fetch_blob_sidecars(&self, block_id: &str) -> anyhow::Result<Vec<BlobSidecar>> {
        let endpoint = self
            .base_url
            .join(&format!("/eth/v1/beacon/blob_sidecars/{block_id}"))?;

        Ok(self
            .client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<DataEnvelope<Vec<BlobSidecar>>>()
            .await?
            .data)
    }

    pub async fn fetch_syncing(&self) -> anyhow::Result<SyncingStatus> {
        let endpoint = self.base_url.join("/eth/v1/node/syncing")?;

        Ok(self
            .client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<DataEnvelope<SyncingStatus>>()
            .await?
            .data)
    }

    pub async fn fetch_node_version(&self) -> anyhow::Result<String> {
        #[derive(Deserialize)]
        struct NodeVersion {
            version: String,
        }

        let endpoint = self.base_url.join("/eth/v1/node/version")?;

        Ok(self
            .client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<DataEnvelope<NodeVersion>>()
            .await?
            .data
            .version)
    }

    pub fn events_url(&self, topics: &str) -> anyhow::Result<Url> {
        Ok(self
            .base_url
            .join(&format!("/eth/v1/events?topics={topics}"))?)
    }
}
