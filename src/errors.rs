//! Lease Manager Error Hierarchy
//!
//! Defines the error types surfaced by the handle manager, categorized by the
//! layer that produced them: configuration, storage engine, lease state.

use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failures reported by the underlying storage engine
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Handle lease violations (timeouts, usage after close)
    #[error(transparent)]
    Lease(#[from] LeaseError),

    /// Config encode/decode failures
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Unrecoverable failures
    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Error {
    /// Whether the failure is worth retrying at `retry_interval`.
    ///
    /// Only lock contention on the store path qualifies; every other engine
    /// failure is fatal for the current acquisition.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Storage(StorageError::Busy { .. }))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failures while opening or flushing the store
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// The store is locked by another opener
    #[error("Store at {path} is locked by another opener")]
    Busy { path: PathBuf },

    /// Embedded database errors
    #[error("Embedded database error: {0}")]
    DbError(String),

    /// Caller supplied parameters the engine cannot serve
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LeaseError {
    /// The handle could not be opened before the acquisition deadline
    #[error("Failed to acquire db {path} within {timeout:?}")]
    AcquisitionTimeout { path: PathBuf, timeout: Duration },

    /// Operation invoked after `close()`
    #[error("Handle manager for {path} is closed")]
    ManagerClosed { path: PathBuf },

    /// The maintenance thread could not be started
    #[error("Failed to spawn releaser thread: {0}")]
    ReleaserSpawn(#[source] std::io::Error),
}

// Serialization is classified separately from storage: it only concerns config
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("Bincode serialization failed: {0}")]
    Bincode(#[from] bincode::Error),
}

// ============== Conversion Implementations ============== //
impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(SerializationError::Bincode(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(StorageError::IoError(e))
    }
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        StorageError::DbError(err.to_string()).into()
    }
}
