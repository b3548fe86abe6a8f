use bytes::Bytes;

use super::{Format, FormatError};
use crate::entry::CacheEntry;

/// JSON format (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn serialize(&self, entry: &CacheEntry) -> Result<Bytes, FormatError> {
        serde_json::to_vec(entry)
            .map(Bytes::from)
            .map_err(|error| FormatError::Serialize(Box::new(error)))
    }

    fn deserialize(&self, data: &[u8]) -> Result<CacheEntry, FormatError> {
        serde_json::from_slice(data).map_err(|error| FormatError::Deserialize(Box::new(error)))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}
