//! # interpose-policy
//!
//! Policy interceptors for the interpose pipeline.
//!
//! - [`ThrottleInterceptor`]: rejects requests that exceed a request budget,
//!   either a minimum delay ([`DelayThrottler`]) or a count per window
//!   ([`WindowThrottler`]).
//! - [`RobotsInterceptor`]: honours robots.txt `Disallow` rules and crawl
//!   delays per agent and host.
//! - [`SourceAddressInterceptor`] and [`TlsVersionInterceptor`]: contribute
//!   connection pool settings.
//!
//! Rejections surface as [`interpose_core::PolicyRejection`] and never reach
//! the transport.

pub mod connection;
pub mod robots;
pub mod throttle;

pub use connection::{SourceAddressInterceptor, TlsVersionInterceptor};
pub use robots::{ANY_AGENT, AgentRules, RobotsInterceptor, RobotsRules, StaticRules};
pub use throttle::{
    DelayThrottler, EveryInterval, Resetter, ThrottleInterceptor, Throttler, WindowThrottler,
    per_hour,
};
