//! # interpose-cache
//!
//! An HTTP cache for the interpose pipeline.
//!
//! [`CacheInterceptor`] stores GET responses in any
//! [`CacheBackend`](interpose_backend::CacheBackend), answers fresh ones
//! without touching the network and revalidates stale ones with
//! `If-None-Match` / `If-Modified-Since`. Responses are stored while the
//! caller reads them, through a [`CacheWriter`] body.
//!
//! ```ignore
//! use interpose::PipelineBuilder;
//! use interpose_cache::CacheInterceptor;
//! use interpose_moka::MokaBackend;
//! use interpose_reqwest::ReqwestTransport;
//!
//! let pipeline = PipelineBuilder::new()
//!     .register(CacheInterceptor::builder(MokaBackend::builder(1_000).build()).build())
//!     .build(ReqwestTransport::new())?;
//! ```

mod config;
pub mod freshness;
mod interceptor;
mod state;
mod writer;

pub use config::CacheConfig;
pub use freshness::Heuristic;
pub use interceptor::{CacheInterceptor, CacheInterceptorBuilder};
pub use state::CacheState;
pub use writer::{CacheWriter, OnComplete};
