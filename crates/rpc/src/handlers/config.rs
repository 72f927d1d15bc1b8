use std::sync::Arc;

use alloy_primitives::{Address, aliases::B32};
use checkpointz_beacon::FinalityProvider;
use serde::Serialize;
use warp::{
    http::header::CACHE_CONTROL,
    reject::Rejection,
    reply::{Reply, with_header},
};

use crate::types::{errors::ApiError, response::DataResponse};

#[derive(Debug, Serialize)]
struct DepositContract {
    #[serde(with = "serde_utils::quoted_u64")]
    chain_id: u64,
    address: Address,
}

#[derive(Debug, Serialize)]
struct Fork {
    previous_version: B32,
    current_version: B32,
    #[serde(with = "serde_utils::quoted_u64")]
    epoch: u64,
}

/// Called by `/eth/v1/config/spec`, passing through the raw key/value map
/// collected from upstreams.
pub async fn get_spec(provider: Arc<FinalityProvider>) -> Result<impl Reply, Rejection> {
    let spec = provider.spec().map_err(ApiError::from)?;

    Ok(with_header(
        DataResponse::json(&spec.raw),
        CACHE_CONTROL,
        "public, s-max-age=30",
    ))
}

/// Called by `/eth/v1/config/deposit_contract`.
pub async fn get_deposit_contract(
    provider: Arc<FinalityProvider>,
) -> Result<impl Reply, Rejection> {
    let spec = provider.spec().map_err(ApiError::from)?;

    Ok(with_header(
        DataResponse::json(DepositContract {
            chain_id: spec.deposit_chain_id,
            address: spec.deposit_contract_address,
        }),
        CACHE_CONTROL,
        "public, s-max-age=30",
    ))
}

/// Called by `/eth/v1/config/fork_schedule`, derived from the cached spec's
/// named forks sorted by activation epoch.
pub async fn get_fork_schedule(provider: Arc<FinalityProvider>) -> Result<impl Reply, Rejection> {
    let spec = provider.spec().map_err(ApiError::from)?;

    let mut forks = Vec::with_capacity(spec.forks.len());

    for (index, fork) in spec.forks.iter().enumerate() {
        let previous_version = if index == 0 {
            fork.version
        } else {
            spec.forks[index - 1].version
        };

        forks.push(Fork {
            previous_version,
            current_version: fork.version,
            epoch: fork.epoch,
        });
    }

    Ok(with_header(
        DataResponse::json(forks),
        CACHE_CONTROL,
        "public, s-max-age=30",
    ))
}
