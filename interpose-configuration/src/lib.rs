//! # interpose-configuration
//!
//! Describe an interpose pipeline in YAML and assemble it at runtime.
//!
//! ```
//! use interpose_configuration::PipelineConfig;
//!
//! let config = PipelineConfig::from_yaml(
//!     r#"
//! throttle:
//!   Window:
//!     count: 60
//!     interval: 1m
//! cache:
//!   cache_etags: false
//! "#,
//! )
//! .unwrap();
//! let _builder = config.into_builder().unwrap();
//! ```

pub mod backend;
pub mod error;
pub mod pipeline;
pub mod policy;

pub use backend::{Backend, Moka, ValueSerialization};
pub use error::ConfigError;
pub use pipeline::{Cache, PipelineConfig};
pub use policy::{Robots, Throttle};
