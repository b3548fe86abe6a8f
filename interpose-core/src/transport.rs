//! Transport trait for the component that actually talks to the network.
//!
//! The pipeline never performs I/O itself. Connection pooling, TLS and DNS
//! belong to the transport; the pipeline only decides *whether* the
//! transport is called and what happens to what it returns.
//!
//! Dropping the future returned by [`Transport::send`] cancels the call, and
//! the pipeline adds no timeouts of its own.

use async_trait::async_trait;

use crate::error::Error;
use crate::pool::PoolConfig;
use crate::request::Request;
use crate::response::{FinalResponse, RawResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Connection pool (or client handle) produced by [`connect`](Self::connect).
    type Connection: Send + Sync;

    /// Builds the connection pool from the effective pool configuration.
    fn connect(&self, config: &PoolConfig) -> Result<Self::Connection, Error>;

    /// Sends `request` and returns the response as soon as its head arrived.
    async fn send(
        &self,
        connection: &Self::Connection,
        request: &Request,
    ) -> Result<RawResponse, Error>;

    /// Turns a raw response into the response handed to the caller.
    fn build_response(&self, request: &Request, response: RawResponse) -> FinalResponse {
        FinalResponse::from_raw(request, response)
    }
}
