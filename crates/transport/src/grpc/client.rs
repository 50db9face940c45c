//! GrpcClient - connects per call

use contracts::Message;
use std::time::Duration;
use tonic::transport::Channel;
use tracing::instrument;

use crate::codec::{from_proto, to_proto};
use crate::proto::pipeline_service_client::PipelineServiceClient;
use crate::TransportError;

/// gRPC client for a single stage endpoint
#[derive(Debug, Clone)]
pub struct GrpcClient {
    addr: String,
    timeout: Duration,
}

impl GrpcClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Call `Process`; connect and request are both bounded by the timeout
    #[instrument(name = "grpc_call", skip(self, message), fields(addr = %self.addr))]
    pub async fn call(&self, message: &Message) -> Result<Message, TransportError> {
        tokio::time::timeout(self.timeout, self.exchange(message))
            .await
            .map_err(|_| TransportError::Timeout {
                addr: self.addr.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
    }

    async fn exchange(&self, message: &Message) -> Result<Message, TransportError> {
        let endpoint = Channel::from_shared(format!("http://{}", self.addr)).map_err(|e| {
            TransportError::InvalidAddress {
                addr: self.addr.clone(),
                message: e.to_string(),
            }
        })?;

        let channel = endpoint
            .connect_timeout(self.timeout)
            .timeout(self.timeout)
            .connect()
            .await
            .map_err(|e| TransportError::connect(&self.addr, e))?;

        let mut client = PipelineServiceClient::new(channel);
        let response = client
            .process(to_proto(message))
            .await
            .map_err(|status| TransportError::remote(&self.addr, status.message()))?;

        Ok(from_proto(response.into_inner()))
    }
}
