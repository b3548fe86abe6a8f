use std::sync::Arc;

use interpose_core::{Error, Interceptor, PoolConfig, Transport};

use crate::connect::fold_pool_config;
use crate::pipeline::Pipeline;

/// Builder for [`Pipeline`].
///
/// Interceptors are registered in priority order: the first registered one
/// sees the request first during pre-send, sees the response last during the
/// build phase, and wins conflicting pool settings. Registration is only
/// possible here, so the interceptor list is fixed before any request is
/// sent.
///
/// ```ignore
/// use interpose::PipelineBuilder;
///
/// let pipeline = PipelineBuilder::new()
///     .register(robots)
///     .register(cache)
///     .build(ReqwestTransport::new())?;
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    interceptors: Vec<Arc<dyn Interceptor>>,
    pool_config: PoolConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor to the chain.
    ///
    /// Pass an `Arc<I>` to keep a handle on the interceptor's state.
    pub fn register<I>(mut self, interceptor: I) -> Self
    where
        I: Interceptor + 'static,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Base pool configuration the interceptors' contributions are folded over.
    pub fn pool_config(mut self, config: PoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    /// Folds the pool configuration, connects the transport and returns the
    /// finished pipeline.
    ///
    /// Fails with [`Error::ConfigurationConflict`] before any network I/O if
    /// the interceptors' pool settings are incompatible.
    pub fn build<T: Transport>(self, transport: T) -> Result<Pipeline<T>, Error> {
        let pool_config = fold_pool_config(self.pool_config, &self.interceptors)?;
        let connection = transport.connect(&pool_config)?;
        Ok(Pipeline {
            transport,
            connection,
            interceptors: self.interceptors,
            pool_config,
        })
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field(
                "interceptors",
                &self
                    .interceptors
                    .iter()
                    .map(|interceptor| interceptor.name())
                    .collect::<Vec<_>>(),
            )
            .field("pool_config", &self.pool_config)
            .finish()
    }
}
