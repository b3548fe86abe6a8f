use std::net::SocketAddr;
use std::sync::Arc;

use interpose::{Pipeline, PipelineBuilder, PoolConfig, TlsVersion, Transport};
use interpose_backend::Backend as _;
use interpose_cache::{CacheConfig, CacheInterceptor, Heuristic};
use interpose_policy::{SourceAddressInterceptor, TlsVersionInterceptor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::Backend;
use crate::error::{ConfigError, Result};
use crate::policy::{Robots, Throttle};

fn default_cache_etags() -> bool {
    true
}

/// Cache interceptor settings and the backend it stores into.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Cache {
    #[serde(default = "default_cache_etags")]
    pub cache_etags: bool,
    #[serde(default)]
    pub heuristic: Option<Heuristic>,
    #[serde(default)]
    pub backend: Backend,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            cache_etags: default_cache_etags(),
            heuristic: None,
            backend: Backend::default(),
        }
    }
}

impl Cache {
    pub fn config(&self) -> CacheConfig {
        CacheConfig {
            cache_etags: self.cache_etags,
            heuristic: self.heuristic,
        }
    }
}

/// A whole pipeline described in YAML.
///
/// Interceptors are registered in a fixed order: robots, throttle, cache,
/// then the connection overrides.
///
/// ```yaml
/// pool:
///   max_idle_per_host: 4
///   connect_timeout: 5s
/// tls_version: TLSv1.2
/// throttle:
///   Delay:
///     delay: 1s
/// cache:
///   heuristic: LastModified
///   backend:
///     type: Moka
///     max_capacity: 1000
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    pub pool: PoolConfig,
    pub source_address: Option<SocketAddr>,
    pub tls_version: Option<TlsVersion>,
    pub throttle: Option<Throttle>,
    pub robots: Option<Robots>,
    pub cache: Option<Cache>,
}

impl PipelineConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml).map_err(|error| ConfigError::Parse(Box::new(error)))
    }

    /// Registers every configured interceptor on a fresh builder.
    pub fn into_builder(self) -> Result<PipelineBuilder> {
        let mut builder = PipelineBuilder::new().pool_config(self.pool);

        if let Some(robots) = self.robots {
            builder = robots.register(builder);
        }
        if let Some(throttle) = self.throttle {
            builder = throttle.register(builder)?;
        }
        if let Some(cache) = self.cache {
            let config = cache.config();
            let backend = cache.backend.into_backend()?;
            debug!(backend = backend.label(), ?config, "cache configured");
            builder = builder.register(CacheInterceptor::new(Arc::new(backend), config));
        }
        if let Some(address) = self.source_address {
            builder = builder.register(SourceAddressInterceptor::new(address));
        }
        if let Some(version) = self.tls_version {
            builder = builder.register(TlsVersionInterceptor::new(version));
        }
        Ok(builder)
    }

    /// Assembles the pipeline and connects `transport`.
    pub fn build<T: Transport>(self, transport: T) -> Result<Pipeline<T>> {
        Ok(self.into_builder()?.build(transport)?)
    }
}
