pub mod blob_sidecars;
pub mod block;
pub mod deposit_snapshot;
pub mod state;

pub use blob_sidecars::BlobSidecarStore;
pub use block::BlockStore;
pub use deposit_snapshot::DepositSnapshotStore;
pub use state::StateStore;
