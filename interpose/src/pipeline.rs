use std::fmt;
use std::sync::Arc;

use interpose_core::{
    Error, FinalResponse, Flow, Interceptor, Outcome, PoolConfig, RawResponse, Request, Transport,
};
use tracing::{debug, trace};

/// An ordered chain of interceptors in front of a transport.
///
/// Built once through [`PipelineBuilder`](crate::PipelineBuilder); the interceptor list cannot
/// change afterwards, so a pipeline can be shared across tasks behind an
/// [`Arc`].
pub struct Pipeline<T: Transport> {
    pub(crate) transport: T,
    pub(crate) connection: T::Connection,
    pub(crate) interceptors: Vec<Arc<dyn Interceptor>>,
    pub(crate) pool_config: PoolConfig,
}

impl<T: Transport> Pipeline<T> {
    /// Effective pool configuration the transport was connected with.
    pub fn pool_config(&self) -> &PoolConfig {
        &self.pool_config
    }

    /// Connection produced by [`Transport::connect`].
    pub fn connection(&self) -> &T::Connection {
        &self.connection
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Names of the registered interceptors, in registration order.
    pub fn interceptor_names(&self) -> impl Iterator<Item = &str> {
        self.interceptors.iter().map(|interceptor| interceptor.name())
    }

    /// Sends `request` through the chain.
    ///
    /// Pre-send hooks run in registration order; the first one returning
    /// [`Flow::ShortCircuit`] ends the phase and the transport is skipped.
    /// A short-circuit with a [`FinalResponse`] is returned as is, a
    /// [`RawResponse`] goes through [`build_response`](Self::build_response)
    /// like a transport response would.
    #[tracing::instrument(skip_all, fields(method = %request.method(), uri = %request.uri()))]
    pub async fn send(&self, mut request: Request) -> Result<FinalResponse, Error> {
        for interceptor in &self.interceptors {
            trace!(interceptor = interceptor.name(), "before_send");
            if let Flow::ShortCircuit(outcome) = interceptor.before_send(&mut request).await? {
                debug!(interceptor = interceptor.name(), "request short-circuited");
                return self.short_circuit(interceptor.name(), request, outcome).await;
            }
        }

        let response = self.transport.send(&self.connection, &request).await?;
        Ok(self.build_response(request, response).await)
    }

    /// Builds the final response for `request` out of `response`.
    ///
    /// Pre-build hooks run in reverse registration order, each receiving the
    /// pair returned by the previous one. The transport builds the final
    /// response from the last pair, then post-build hooks run in reverse
    /// registration order with the request this call started with.
    pub async fn build_response(&self, request: Request, response: RawResponse) -> FinalResponse {
        let original = request.clone();
        let (mut request, mut response) = (request, response);
        for interceptor in self.interceptors.iter().rev() {
            trace!(interceptor = interceptor.name(), "before_build");
            (request, response) = interceptor.before_build(request, response).await;
        }

        let head = response.head.clone();
        let mut built = self.transport.build_response(&request, response);

        for interceptor in self.interceptors.iter().rev() {
            trace!(interceptor = interceptor.name(), "after_build");
            built = interceptor.after_build(&original, &head, built).await;
        }
        built
    }

    async fn short_circuit(
        &self,
        interceptor: &str,
        request: Request,
        outcome: Outcome,
    ) -> Result<FinalResponse, Error> {
        let status = match &outcome {
            Outcome::Raw(raw) => raw.status(),
            Outcome::Final(response) => response.status(),
        };
        if status.is_informational() {
            return Err(Error::ContractViolation {
                interceptor: interceptor.to_owned(),
                reason: format!("short-circuited with informational status {status}"),
            });
        }

        match outcome {
            Outcome::Final(response) => Ok(response),
            Outcome::Raw(raw) => Ok(self.build_response(request, raw).await),
        }
    }
}

impl<T> fmt::Debug for Pipeline<T>
where
    T: Transport + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("transport", &self.transport)
            .field(
                "interceptors",
                &self.interceptor_names().collect::<Vec<_>>(),
            )
            .field("pool_config", &self.pool_config)
            .finish()
    }
}
