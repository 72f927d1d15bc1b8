use std::{collections::BTreeMap, sync::Arc};

use alloy_primitives::B256;
use checkpointz_beacon::{FinalityProvider, status::UpstreamStatus};
use checkpointz_consensus::{checkpoint::Finality, slot::SlotTime};
use serde::Serialize;
use warp::{
    http::header::CACHE_CONTROL,
    reject::Rejection,
    reply::{Reply, with_header},
};

use crate::{types::errors::ApiError, version};

#[derive(Debug, Serialize)]
struct StatusVersion {
    full: String,
    short: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    version: StatusVersion,
    operating_mode: String,
    upstreams: BTreeMap<String, UpstreamStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finality: Option<Finality>,
    #[serde(skip_serializing_if = "String::is_empty")]
    public_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    brand_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    brand_image_url: String,
}

#[derive(Debug, Serialize)]
struct BeaconSlot {
    #[serde(with = "serde_utils::quoted_u64")]
    slot: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_root: Option<B256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_root: Option<B256>,
    #[serde(with = "serde_utils::quoted_u64")]
    epoch: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    slot_time: Option<SlotTime>,
}

#[derive(Debug, Serialize)]
struct BeaconSlotsResponse {
    slots: Vec<BeaconSlot>,
}

#[derive(Debug, Serialize)]
struct BeaconSlotResponse {
    slot: BeaconSlot,
}

fn beacon_slot(provider: &FinalityProvider, slot: u64, epoch: u64) -> BeaconSlot {
    let (block_root, state_root) = match provider.get_block_by_slot(slot) {
        Ok(block) => (
            provider.encoder().block_root(&block).ok(),
            Some(block.state_root()),
        ),
        Err(_) => (None, None),
    };

    BeaconSlot {
        slot,
        block_root,
        state_root,
        epoch,
        slot_time: provider.get_slot_time(slot).ok(),
    }
}

/// Called by `/checkpointz/v1/status`.
pub async fn get_status(provider: Arc<FinalityProvider>) -> Result<impl Reply, Rejection> {
    let frontend = provider.frontend_config();

    let response = StatusResponse {
        version: StatusVersion {
            full: version::full(),
            short: version::short(),
        },
        operating_mode: provider.operating_mode().to_string(),
        upstreams: provider
            .upstreams_status()
            .into_iter()
            .map(|status| (status.name.clone(), status))
            .collect(),
        finality: provider.finalized().ok(),
        public_url: frontend.public_url.clone(),
        brand_name: frontend.brand_name.clone(),
        brand_image_url: frontend.brand_image_url.clone(),
    };

    Ok(with_header(
        warp::reply::json(&response),
        CACHE_CONTROL,
        "public, s-max-age=5",
    ))
}

/// Called by `/checkpointz/v1/beacon/slots`.
pub async fn get_slots(provider: Arc<FinalityProvider>) -> Result<impl Reply, Rejection> {
    let slots = provider.list_finalized_slots().map_err(ApiError::from)?;

    let mut response = BeaconSlotsResponse {
        slots: Vec::with_capacity(slots.len()),
    };

    for slot in slots {
        let epoch = provider.get_epoch_by_slot(slot).map_err(ApiError::from)?;

        response.slots.push(beacon_slot(&provider, slot, epoch));
    }

    Ok(with_header(
        warp::reply::json(&response),
        CACHE_CONTROL,
        "public, s-max-age=5",
    ))
}

/// Called by `/checkpointz/v1/beacon/slots/{slot}`.
pub async fn get_slot(
    slot: u64,
    provider: Arc<FinalityProvider>,
) -> Result<impl Reply, Rejection> {
    let epoch = provider.get_epoch_by_slot(slot).map_err(ApiError::from)?;

    Ok(with_header(
        warp::reply::json(&BeaconSlotResponse {
            slot: beacon_slot(&provider, slot, epoch),
        }),
        CACHE_CONTROL,
        "public, s-max-age=5",
    ))
}

/// Called by `/checkpointz/v1/ready`: 200 iff a serving checkpoint exists.
pub async fn get_ready(provider: Arc<FinalityProvider>) -> Result<impl Reply, Rejection> {
    provider.finalized().map_err(ApiError::from)?;

    Ok(warp::reply::json(&true))
}
