//! The interceptor capability and its pre-send result.
//!
//! An [`Interceptor`] takes part in four stages of a call. Every hook has a
//! default that leaves the call untouched, so implementations override only
//! the stages they care about:
//!
//! | Hook                                    | Order               | Effect                           |
//! |-----------------------------------------|---------------------|----------------------------------|
//! | [`configure_pool`](Interceptor::configure_pool) | reverse, folded  | contributes pool settings  |
//! | [`before_send`](Interceptor::before_send)       | registration     | first short-circuit wins   |
//! | [`before_build`](Interceptor::before_build)     | reverse, chained | replaces request/raw pair  |
//! | [`after_build`](Interceptor::after_build)       | reverse, chained | replaces final response    |

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::pool::{PoolConfig, PoolSetup};
use crate::request::Request;
use crate::response::{FinalResponse, RawResponse, ResponseHead};

/// A response produced by an interceptor instead of the transport.
#[derive(Debug)]
pub enum Outcome {
    /// A wire-level response; the pipeline still runs the build phase on it.
    Raw(RawResponse),
    /// A finished response, returned to the caller as is.
    Final(FinalResponse),
}

impl From<RawResponse> for Outcome {
    fn from(response: RawResponse) -> Self {
        Outcome::Raw(response)
    }
}

impl From<FinalResponse> for Outcome {
    fn from(response: FinalResponse) -> Self {
        Outcome::Final(response)
    }
}

/// Result of [`Interceptor::before_send`].
#[derive(Debug)]
pub enum Flow {
    /// Hand the request to the next interceptor, then the transport.
    Continue,
    /// Stop here: skip the remaining interceptors and the transport.
    ShortCircuit(Outcome),
}

impl Flow {
    pub fn short_circuit(response: impl Into<Outcome>) -> Self {
        Flow::ShortCircuit(response.into())
    }
}

/// A pluggable participant in the request/response pipeline.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Name used in logs and contract violation reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Contributes connection pool settings while the pipeline connects.
    ///
    /// `config` is the configuration folded so far.
    fn configure_pool(&self, _config: &PoolConfig) -> Option<PoolSetup> {
        None
    }

    /// Runs before the request is sent. May rewrite the request, answer it
    /// directly with [`Flow::ShortCircuit`], or reject it with an error.
    async fn before_send(&self, _request: &mut Request) -> Result<Flow, Error> {
        Ok(Flow::Continue)
    }

    /// Runs before the transport builds the final response and may replace
    /// either half of the pair.
    async fn before_build(&self, request: Request, response: RawResponse) -> (Request, RawResponse) {
        (request, response)
    }

    /// Runs after the final response is built. `head` is the head of the raw
    /// response the final one was built from.
    async fn after_build(
        &self,
        _request: &Request,
        _head: &ResponseHead,
        response: FinalResponse,
    ) -> FinalResponse {
        response
    }
}

#[async_trait]
impl<I> Interceptor for Arc<I>
where
    I: Interceptor + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn configure_pool(&self, config: &PoolConfig) -> Option<PoolSetup> {
        (**self).configure_pool(config)
    }

    async fn before_send(&self, request: &mut Request) -> Result<Flow, Error> {
        (**self).before_send(request).await
    }

    async fn before_build(&self, request: Request, response: RawResponse) -> (Request, RawResponse) {
        (**self).before_build(request, response).await
    }

    async fn after_build(
        &self,
        request: &Request,
        head: &ResponseHead,
        response: FinalResponse,
    ) -> FinalResponse {
        (**self).after_build(request, head, response).await
    }
}
