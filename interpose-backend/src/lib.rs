//! Storage side of the interpose HTTP cache.
//!
//! Implement [`Backend`] to plug a new store into the cache; the typed
//! [`CacheBackend`] operations come for free.
mod backend;
mod entry;
pub mod format;
mod key;

pub use backend::{Backend, BackendResult, CacheBackend};
pub use entry::CacheEntry;
pub use format::{BincodeFormat, Format, FormatError, JsonFormat};
pub use key::{CacheKey, normalize_url};
use thiserror::Error;

/// General groups of errors in backend interaction.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network interaction error.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),
    /// Serializing\Deserializing data error.
    #[error(transparent)]
    FormatError(#[from] FormatError),
}

/// Status of deleting result.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
