use std::time::Duration;

use interpose_backend::Backend as BackendTrait;
use interpose_backend::format::BincodeFormat;
use interpose_moka::MokaBackend;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ValueSerialization {
    #[default]
    Json,
    Bincode,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Moka {
    pub max_capacity: u64,
    /// Optional label for this backend (used in tracing).
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub time_to_live: Option<Duration>,
    #[serde(default)]
    pub format: ValueSerialization,
}

impl Default for Moka {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            label: None,
            time_to_live: None,
            format: ValueSerialization::default(),
        }
    }
}

/// Storage the cache interceptor writes to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Backend {
    Moka(Moka),
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Moka(Moka::default())
    }
}

impl Backend {
    pub fn into_backend(self) -> Result<Box<dyn BackendTrait>, ConfigError> {
        match self {
            Backend::Moka(config) => {
                if config.max_capacity == 0 {
                    return Err(ConfigError::Invalid {
                        field: "cache.backend.max_capacity",
                        reason: "must be greater than zero".to_owned(),
                    });
                }
                let mut builder = MokaBackend::builder(config.max_capacity);
                if let Some(label) = config.label {
                    builder = builder.label(label);
                }
                if let Some(ttl) = config.time_to_live {
                    builder = builder.time_to_live(ttl);
                }
                let backend: Box<dyn BackendTrait> = match config.format {
                    ValueSerialization::Json => Box::new(builder.build()),
                    ValueSerialization::Bincode => {
                        Box::new(builder.value_format(BincodeFormat).build())
                    }
                };
                Ok(backend)
            }
        }
    }
}
