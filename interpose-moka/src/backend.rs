//! Moka backend implementation.

use async_trait::async_trait;
use bytes::Bytes;
use interpose_backend::format::{Format, JsonFormat};
use interpose_backend::{Backend, BackendResult, CacheKey, DeleteStatus};
use moka::future::Cache;
use smol_str::SmolStr;

use crate::builder::MokaBackendBuilder;

/// In-memory cache backend powered by Moka.
///
/// Reads are lock-free and writes replace the stored bytes atomically, so a
/// single `MokaBackend` can be shared by every request of a pipeline.
///
/// ```
/// use interpose_moka::MokaBackend;
///
/// let backend = MokaBackend::builder(10_000).build();
/// ```
///
/// Data is not persisted and not shared across processes.
#[derive(Clone)]
pub struct MokaBackend<S = JsonFormat>
where
    S: Format,
{
    /// The underlying Moka async cache instance.
    pub cache: Cache<CacheKey, Bytes>,
    /// Format used to serialize cache entries.
    pub serializer: S,
    pub label: SmolStr,
}

impl<S> std::fmt::Debug for MokaBackend<S>
where
    S: Format,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("cache", &self.cache)
            .field("serializer", &self.serializer.name())
            .finish()
    }
}

impl MokaBackend<JsonFormat> {
    /// Creates a new builder for a cache holding at most `max_entries` entries.
    ///
    /// Least recently used entries are evicted once the cache is full.
    pub fn builder(max_entries: u64) -> MokaBackendBuilder<JsonFormat> {
        MokaBackendBuilder::new(max_entries)
    }
}

impl<S> MokaBackend<S>
where
    S: Format,
{
    pub fn cache(&self) -> &Cache<CacheKey, Bytes> {
        &self.cache
    }
}

#[async_trait]
impl<S> Backend for MokaBackend<S>
where
    S: Format,
{
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Bytes>> {
        Ok(self.cache.get(key).await)
    }

    async fn write(&self, key: &CacheKey, value: Bytes) -> BackendResult<()> {
        self.cache.insert(key.clone(), value).await;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        match self.cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn value_format(&self) -> &dyn Format {
        &self.serializer
    }
}
