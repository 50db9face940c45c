//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// `--endpoint` value not in `stage=host:port` form
    #[error("invalid endpoint override '{value}': {message}")]
    InvalidEndpoint { value: String, message: String },

    /// Serve was asked for a port it cannot determine
    #[error("no port for stage '{stage}': pass --port or configure endpoints.{stage}")]
    MissingPort { stage: String },

    /// Configuration error
    #[error(transparent)]
    Config(#[from] contracts::ContractError),

    /// Pipeline binding or execution error
    #[error(transparent)]
    Pipeline(#[from] pipeline::PipelineError),

    /// Server error
    #[error(transparent)]
    Transport(#[from] transport::TransportError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn invalid_endpoint(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            value: value.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
