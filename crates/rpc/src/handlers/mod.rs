use std::sync::Arc;

use checkpointz_beacon::FinalityProvider;
use checkpointz_consensus::{block::VersionedSignedBeaconBlock, state::VersionedBeaconState};

use crate::types::{
    errors::ApiError,
    id::{BlockId, StateId},
};

pub mod beacon;
pub mod checkpointz;
pub mod config;
pub mod debug;
pub mod node;

/// Resolves a block id against the engine's caches. `head` and `finalized`
/// both resolve to the serving checkpoint: the gateway only ever exposes the
/// finalized bundle it has decided to serve.
pub(crate) fn resolve_block(
    provider: &FinalityProvider,
    id: &BlockId,
) -> Result<Arc<VersionedSignedBeaconBlock>, ApiError> {
    let block = match id {
        BlockId::Slot(slot) => provider.get_block_by_slot(*slot),
        BlockId::Root(root) => provider.get_block_by_root(*root),
        BlockId::Genesis => provider.get_block_by_slot(0),
        BlockId::Head | BlockId::Finalized => {
            let serving = provider.finalized()?;

            provider.get_block_by_root(serving.finalized.root)
        }
    }?;

    Ok(block)
}

pub(crate) fn resolve_state(
    provider: &FinalityProvider,
    id: &StateId,
) -> Result<Arc<VersionedBeaconState>, ApiError> {
    let state = match id {
        StateId::Slot(slot) => provider.get_state_by_slot(*slot),
        StateId::Root(root) => provider.get_state_by_state_root(*root),
        StateId::Genesis => provider.get_state_by_slot(0),
        StateId::Head | StateId::Finalized => {
            let serving = provider.finalized()?;

            provider.get_state_by_root(serving.finalized.root)
        }
    }?;

    Ok(state)
}
