//! # interpose-core
//!
//! Core traits and types for the interpose HTTP client pipeline.
//!
//! This crate defines the contract shared by the pipeline orchestrator
//! (`interpose`), the transports (`interpose-reqwest`) and every
//! interceptor (`interpose-cache`, `interpose-policy`):
//!
//! - **Messages**: [`Request`], [`RawResponse`], [`FinalResponse`], [`Body`]
//! - **Extension points**: [`Interceptor`], [`Flow`], [`Outcome`]
//! - **Connection setup**: [`PoolConfig`], [`PoolOverrides`], [`PoolSetup`]
//! - **I/O boundary**: [`Transport`]
//! - **Errors**: [`Error`], [`PolicyRejection`]

pub mod body;
pub mod error;
pub mod interceptor;
pub mod pool;
pub mod request;
pub mod response;
pub mod transport;

pub use body::{Body, BoxError};
pub use error::{Error, PolicyRejection, Result};
pub use interceptor::{Flow, Interceptor, Outcome};
pub use pool::{PoolConfig, PoolOverrides, PoolSetup, TlsVersion};
pub use request::Request;
pub use response::{FinalResponse, RawResponse, ResponseHead};
pub use transport::Transport;
