//! Serialization formats for cache entries.
//!
//! Backends store opaque bytes; a [`Format`] turns a [`CacheEntry`] into
//! those bytes and back. [`JsonFormat`] is the default and keeps stored
//! entries human readable, [`BincodeFormat`] is more compact.

use bytes::Bytes;
use thiserror::Error;

use crate::entry::CacheEntry;

mod bincode;
mod json;

pub use self::bincode::BincodeFormat;
pub use self::json::JsonFormat;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Converts cache entries to and from their stored form.
pub trait Format: Send + Sync {
    fn serialize(&self, entry: &CacheEntry) -> Result<Bytes, FormatError>;

    fn deserialize(&self, data: &[u8]) -> Result<CacheEntry, FormatError>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}
