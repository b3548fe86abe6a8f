//! Builder for configuring [`MokaBackend`].

use std::time::Duration;

use bytes::Bytes;
use interpose_backend::CacheKey;
use interpose_backend::format::{Format, JsonFormat};
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use smol_str::SmolStr;

use crate::backend::MokaBackend;

/// Builder for creating and configuring a [`MokaBackend`].
///
/// Use [`MokaBackend::builder`] to create a new builder instance.
///
/// ```
/// use std::time::Duration;
/// use interpose_backend::BincodeFormat;
/// use interpose_moka::MokaBackend;
///
/// let backend = MokaBackend::builder(10_000)
///     .label("pages")
///     .time_to_live(Duration::from_secs(3600))
///     .value_format(BincodeFormat)
///     .build();
/// ```
pub struct MokaBackendBuilder<S = JsonFormat>
where
    S: Format,
{
    max_entries: u64,
    time_to_live: Option<Duration>,
    eviction_policy: EvictionPolicy,
    serializer: S,
    label: SmolStr,
}

impl MokaBackendBuilder<JsonFormat> {
    /// Creates a builder for a cache holding at most `max_entries` entries.
    pub fn new(max_entries: u64) -> Self {
        Self {
            max_entries,
            time_to_live: None,
            eviction_policy: EvictionPolicy::lru(),
            serializer: JsonFormat,
            label: SmolStr::new_static("moka"),
        }
    }
}

impl<S> MokaBackendBuilder<S>
where
    S: Format,
{
    /// Sets a custom label for this backend, used in logs.
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Evicts entries this long after they were written, whatever their
    /// HTTP freshness.
    ///
    /// Entries are kept until evicted for capacity by default.
    pub fn time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    /// Sets the eviction policy. Defaults to [`EvictionPolicy::lru()`].
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    /// Sets the cache value serialization format.
    ///
    /// | Format | Size | Human-readable |
    /// |--------|------|----------------|
    /// | [`JsonFormat`] | Large | Yes |
    /// | [`BincodeFormat`](interpose_backend::BincodeFormat) | Compact | No |
    pub fn value_format<NewS>(self, serializer: NewS) -> MokaBackendBuilder<NewS>
    where
        NewS: Format,
    {
        MokaBackendBuilder {
            max_entries: self.max_entries,
            time_to_live: self.time_to_live,
            eviction_policy: self.eviction_policy,
            serializer,
            label: self.label,
        }
    }

    pub fn build(self) -> MokaBackend<S> {
        let mut builder = CacheBuilder::new(self.max_entries).eviction_policy(self.eviction_policy);
        if let Some(ttl) = self.time_to_live {
            builder = builder.time_to_live(ttl);
        }
        let cache: Cache<CacheKey, Bytes> = builder.build();

        MokaBackend {
            cache,
            serializer: self.serializer,
            label: self.label,
        }
    }
}
