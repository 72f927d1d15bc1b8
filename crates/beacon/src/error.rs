use checkpointz_cache::CacheError;
use checkpointz_upstream::PoolError;
use thiserror::Error;

/// Error kinds surfaced by the finality engine.
///
/// `NotReady`, `NoNodes` and `Transport` are transient and retried by the
/// enclosing loop on its next tick; `BundleMismatch` and `MisalignedBundle`
/// abort the current transition without touching the serving checkpoint.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found")]
    NotFound,

    #[error("not ready: {0}")]
    NotReady(&'static str),

    #[error("no majority finality found")]
    NoMajority,

    #[error("no nodes found")]
    NoNodes,

    #[error("fetched block root does not match requested root")]
    BundleMismatch,

    #[error("block slot {slot} is not aligned to an epoch boundary")]
    MisalignedBundle { slot: u64 },

    #[error("upstream failure: {0}")]
    Transport(anyhow::Error),
}

impl Error {
    /// True for kinds the enclosing loop should simply retry on its next
    /// tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::NotReady(_) | Error::NoNodes | Error::NoMajority | Error::Transport(_)
        )
    }
}

impl From<PoolError> for Error {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::NoNodes => Error::NoNodes,
        }
    }
}

impl From<CacheError> for Error {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::NotFound => Error::NotFound,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
