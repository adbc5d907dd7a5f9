//! Error types for the health diary pipeline.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration and static table loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse {table}: {source}")]
    Json {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extractor input errors. The length check is the only one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Message exceeds maximum length of {max} characters (current: {length})")]
    MessageTooLong { length: usize, max: usize },
}

/// Errors raised by history/record store backends.
///
/// Missing data is never an error; backends return empty collections.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store backend failed: {0}")]
    Backend(String),
}

/// Errors surfaced by the async message processor.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
