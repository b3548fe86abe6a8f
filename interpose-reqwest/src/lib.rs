//! # interpose-reqwest
//!
//! A [`Transport`](interpose_core::Transport) backed by [`reqwest`].
//!
//! The effective pool configuration of a pipeline is turned into a
//! [`reqwest::Client`] once, when the pipeline is built. Responses are handed
//! over as soon as their head arrives; the body keeps streaming from the
//! connection.
//!
//! ```no_run
//! # async fn run() -> Result<(), interpose_core::Error> {
//! use interpose::{PipelineBuilder, Request};
//! use interpose_reqwest::ReqwestTransport;
//!
//! let pipeline = PipelineBuilder::new().build(ReqwestTransport::new())?;
//! let _response = pipeline
//!     .send(Request::get("https://example.com/".parse().unwrap()))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod transport;

pub use transport::ReqwestTransport;

/// Re-exported so callers can name the connection type.
pub use reqwest::Client;
