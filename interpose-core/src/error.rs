//! Error taxonomy surfaced by the pipeline.

use std::time::Duration;

use thiserror::Error;

use crate::body::BoxError;

/// Result alias used across the pipeline.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A policy interceptor refused to let the request through.
///
/// Callers match on the variant to tell "never allowed" apart from "not
/// allowed right now" and decide themselves whether to retry later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyRejection {
    /// The request target is off-limits for this agent.
    #[error("request to {url} is disallowed for agent {agent:?}")]
    Disallowed { url: String, agent: String },
    /// Too many or too frequent requests; `retry_after` is a hint when known.
    #[error("request to {url} is throttled")]
    Throttled {
        url: String,
        retry_after: Option<Duration>,
    },
}

/// Errors returned by pipeline operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Interceptors asked for incompatible connection pool settings.
    ///
    /// Raised while connecting, before any network I/O.
    #[error("conflicting connection pool setting `{setting}`")]
    ConfigurationConflict { setting: &'static str },

    /// An interceptor returned something the pipeline cannot use.
    #[error("interceptor `{interceptor}` violated the pipeline contract: {reason}")]
    ContractViolation { interceptor: String, reason: String },

    /// A policy interceptor rejected the request.
    #[error(transparent)]
    Rejected(#[from] PolicyRejection),

    /// Error raised by the transport, passed through unmodified.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
}

impl Error {
    /// Wraps a transport error.
    pub fn transport(error: impl Into<BoxError>) -> Self {
        Error::Transport(error.into())
    }

    /// Returns `true` for [`PolicyRejection::Disallowed`].
    pub fn is_disallowed(&self) -> bool {
        matches!(self, Error::Rejected(PolicyRejection::Disallowed { .. }))
    }

    /// Returns `true` for [`PolicyRejection::Throttled`].
    pub fn is_throttled(&self) -> bool {
        matches!(self, Error::Rejected(PolicyRejection::Throttled { .. }))
    }
}
