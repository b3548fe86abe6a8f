use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not valid YAML or does not match the schema.
    #[error("failed to parse pipeline configuration: {0}")]
    Parse(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// The configured interceptors could not be assembled into a pipeline.
    #[error(transparent)]
    Pipeline(#[from] interpose::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
