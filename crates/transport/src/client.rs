//! RemoteClient - transport-agnostic stage client

use contracts::{Message, TransportKind};
use std::time::Duration;

use crate::{GrpcClient, JsonRpcClient, TransportError};

/// Client for a remote stage over either binding
#[derive(Debug, Clone)]
pub enum RemoteClient {
    JsonRpc(JsonRpcClient),
    Grpc(GrpcClient),
}

impl RemoteClient {
    /// Build a client for `addr` ("host:port")
    pub fn new(
        transport: TransportKind,
        addr: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        match transport {
            TransportKind::JsonRpc => Ok(Self::JsonRpc(JsonRpcClient::new(addr, timeout))),
            TransportKind::Grpc => Ok(Self::Grpc(GrpcClient::new(addr, timeout))),
            TransportKind::Local => Err(TransportError::NotRemote(transport)),
        }
    }

    pub fn transport(&self) -> TransportKind {
        match self {
            Self::JsonRpc(_) => TransportKind::JsonRpc,
            Self::Grpc(_) => TransportKind::Grpc,
        }
    }

    pub fn addr(&self) -> &str {
        match self {
            Self::JsonRpc(client) => client.addr(),
            Self::Grpc(client) => client.addr(),
        }
    }

    /// Send the message and return the stage's result
    pub async fn call(&self, message: &Message) -> Result<Message, TransportError> {
        match self {
            Self::JsonRpc(client) => client.call(message).await,
            Self::Grpc(client) => client.call(message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_is_not_a_client() {
        let err = RemoteClient::new(TransportKind::Local, "h:1", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, TransportError::NotRemote(TransportKind::Local)));
    }

    #[test]
    fn test_kind_and_addr() {
        let client =
            RemoteClient::new(TransportKind::Grpc, "service-b:50052", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.transport(), TransportKind::Grpc);
        assert_eq!(client.addr(), "service-b:50052");
    }
}
