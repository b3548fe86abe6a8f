use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::trace;

use crate::entry::CacheEntry;
use crate::format::{Format, JsonFormat};
use crate::key::CacheKey;
use crate::{BackendError, DeleteStatus};

pub type BackendResult<T> = Result<T, BackendError>;

/// Raw storage for serialized cache entries.
///
/// Implementations must tolerate concurrent calls; a `write` replaces the
/// whole stored value at once.
#[async_trait]
pub trait Backend: Sync + Send {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Bytes>>;

    async fn write(&self, key: &CacheKey, value: Bytes) -> BackendResult<()>;

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus>;

    /// Name used in logs.
    fn label(&self) -> &str {
        "backend"
    }

    fn value_format(&self) -> &dyn Format {
        &JsonFormat
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Bytes>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: Bytes) -> BackendResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

#[async_trait]
impl<B> Backend for Arc<B>
where
    B: Backend + ?Sized,
{
    async fn read(&self, key: &CacheKey) -> BackendResult<Option<Bytes>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, value: Bytes) -> BackendResult<()> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

/// Typed operations over [`Backend`], going through its
/// [`value_format`](Backend::value_format).
pub trait CacheBackend: Backend {
    fn get(
        &self,
        key: &CacheKey,
    ) -> impl Future<Output = BackendResult<Option<CacheEntry>>> + Send {
        async move {
            match self.read(key).await? {
                Some(raw) => {
                    let entry = self.value_format().deserialize(&raw)?;
                    trace!(backend = self.label(), %key, bytes = raw.len(), "entry read");
                    Ok(Some(entry))
                }
                None => Ok(None),
            }
        }
    }

    fn set(
        &self,
        key: &CacheKey,
        entry: &CacheEntry,
    ) -> impl Future<Output = BackendResult<()>> + Send {
        async move {
            let raw = self.value_format().serialize(entry)?;
            trace!(backend = self.label(), %key, bytes = raw.len(), "entry written");
            self.write(key, raw).await
        }
    }

    fn delete(&self, key: &CacheKey) -> impl Future<Output = BackendResult<DeleteStatus>> + Send {
        async move { self.remove(key).await }
    }
}

impl<T: Backend + ?Sized> CacheBackend for T {}
