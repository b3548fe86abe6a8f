//! In-memory cache backend for interpose, powered by [`moka`].
mod backend;
mod builder;

pub use backend::MokaBackend;
pub use builder::MokaBackendBuilder;
pub use moka::policy::EvictionPolicy;
