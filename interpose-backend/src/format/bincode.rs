use bytes::Bytes;

use super::{Format, FormatError};
use crate::entry::CacheEntry;

/// Bincode format
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeFormat;

impl Format for BincodeFormat {
    fn serialize(&self, entry: &CacheEntry) -> Result<Bytes, FormatError> {
        ::bincode::serde::encode_to_vec(entry, ::bincode::config::standard())
            .map(Bytes::from)
            .map_err(|error| FormatError::Serialize(Box::new(error)))
    }

    fn deserialize(&self, data: &[u8]) -> Result<CacheEntry, FormatError> {
        let (entry, _read) =
            ::bincode::serde::decode_from_slice(data, ::bincode::config::standard())
                .map_err(|error| FormatError::Deserialize(Box::new(error)))?;
        Ok(entry)
    }

    fn name(&self) -> &'static str {
        "bincode"
    }
}
