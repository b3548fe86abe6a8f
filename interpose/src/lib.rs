//! # interpose
//!
//! A composable interceptor pipeline for HTTP clients.
//!
//! A [`Pipeline`] owns an ordered list of [`Interceptor`]s and a
//! [`Transport`]. Every call goes through three phases:
//!
//! 1. **connect** (once, at build time): interceptors contribute connection
//!    pool settings, folded so that earlier-registered interceptors win.
//! 2. **send**: interceptors run in registration order and may answer the
//!    request themselves, skipping the rest of the chain and the transport.
//! 3. **build**: interceptors run in reverse registration order, first on
//!    the wire-level response, then on the final response.
//!
//! ```ignore
//! use interpose::{PipelineBuilder, Request};
//!
//! let pipeline = PipelineBuilder::new()
//!     .register(throttle)
//!     .register(cache)
//!     .build(transport)?;
//!
//! let response = pipeline.send(Request::get(uri)).await?;
//! println!("from cache: {}", response.served_from_cache());
//! ```

mod builder;
mod connect;
mod pipeline;

pub use builder::PipelineBuilder;
pub use pipeline::Pipeline;

pub use interpose_core::{
    Body, BoxError, Error, FinalResponse, Flow, Interceptor, Outcome, PolicyRejection,
    PoolConfig, PoolOverrides, PoolSetup, RawResponse, Request, ResponseHead, Result, TlsVersion,
    Transport,
};

/// Body type and helpers.
pub mod body {
    pub use interpose_core::body::{Body, BoxError};
}

/// The `interpose` prelude.
///
/// ```rust
/// use interpose::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Error, Flow, Interceptor, PipelineBuilder, Request, Transport};
}
