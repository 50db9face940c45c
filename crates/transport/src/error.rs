//! Transport error types

use contracts::TransportKind;
use thiserror::Error;

/// Errors raised by stage clients and servers
#[derive(Debug, Error)]
pub enum TransportError {
    /// Address could not be turned into an endpoint
    #[error("invalid address '{addr}': {message}")]
    InvalidAddress { addr: String, message: String },

    /// Connection could not be established
    #[error("failed to connect to {addr}: {message}")]
    Connect { addr: String, message: String },

    /// Whole call exceeded its deadline
    #[error("call to {addr} timed out after {timeout_ms}ms")]
    Timeout { addr: String, timeout_ms: u64 },

    /// Server closed the connection without answering
    #[error("no response from server {addr}")]
    NoResponse { addr: String },

    /// Server answered with an error
    #[error("remote error from {addr}: {message}")]
    Remote { addr: String, message: String },

    /// Transport kind cannot be used for remote calls
    #[error("transport '{0}' is not a remote transport")]
    NotRemote(TransportKind),

    /// Malformed request or response
    #[error("protocol error: {0}")]
    Json(#[from] serde_json::Error),

    /// gRPC server error
    #[error("grpc transport error: {0}")]
    Grpc(#[from] tonic::transport::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Create a connect error
    pub fn connect(addr: impl Into<String>, message: impl ToString) -> Self {
        Self::Connect {
            addr: addr.into(),
            message: message.to_string(),
        }
    }

    /// Create a remote error
    pub fn remote(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            addr: addr.into(),
            message: message.into(),
        }
    }

    /// Whether the failure happened before the server saw the request
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::InvalidAddress { .. } | Self::NotRemote(_)
        )
    }
}
