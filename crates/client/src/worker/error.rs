//! Lifecycle error types.

use haven_core::{BodyError, Error};

use crate::fetch::NetworkError;

/// Installation of a generation failed; the worker does not become installed.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// The prefetch list was empty.
    #[error("prefetch list is empty")]
    EmptyList,

    /// A resource could not be retrieved, or answered with a non-2xx status.
    #[error("failed to fetch {resource}: {reason}")]
    FetchFailed { resource: String, reason: String },

    /// The store could not be opened or written.
    #[error("failed to store prefetched resources: {0}")]
    StoreFailed(String),
}

/// A write-back could not be stored. Never surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum CacheWriteError {
    #[error("store rejected entry: {0}")]
    Store(#[from] Error),

    #[error("response body unavailable: {0}")]
    Body(#[from] BodyError),
}

/// The sync endpoint could not be reached.
///
/// Not retried here; the host redelivers the sync signal.
#[derive(Debug, thiserror::Error)]
pub enum SyncDispatchError {
    #[error("sync request failed: {0}")]
    Network(#[from] NetworkError),

    #[error("failed to encode sync payload: {0}")]
    Encode(String),
}

impl From<InstallError> for Error {
    fn from(err: InstallError) -> Self {
        Error::InstallFailed(err.to_string())
    }
}

impl From<SyncDispatchError> for Error {
    fn from(err: SyncDispatchError) -> Self {
        Error::SyncFailed(err.to_string())
    }
}
