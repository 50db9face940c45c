//! JsonRpcClient - one connection per call

use contracts::Message;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, instrument};

use super::{RpcRequest, RpcResponse};
use crate::codec::{from_dict, to_dict};
use crate::TransportError;

/// Text-protocol client for a single stage endpoint
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    addr: String,
    timeout: Duration,
}

impl JsonRpcClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send a message and return the stage's result; the whole exchange is
    /// bounded by the client timeout
    #[instrument(name = "json_rpc_call", skip(self, message), fields(addr = %self.addr))]
    pub async fn call(&self, message: &Message) -> Result<Message, TransportError> {
        tokio::time::timeout(self.timeout, self.exchange(message))
            .await
            .map_err(|_| TransportError::Timeout {
                addr: self.addr.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
    }

    async fn exchange(&self, message: &Message) -> Result<Message, TransportError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| TransportError::connect(&self.addr, e))?;
        let (reader, mut writer) = stream.into_split();

        let mut payload = serde_json::to_vec(&RpcRequest::process(to_dict(message)))?;
        payload.push(b'\n');
        writer.write_all(&payload).await?;

        let mut line = String::new();
        BufReader::new(reader).read_line(&mut line).await?;
        if line.trim().is_empty() {
            return Err(TransportError::NoResponse {
                addr: self.addr.clone(),
            });
        }

        let response: RpcResponse = serde_json::from_str(line.trim_end())?;
        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            return Err(TransportError::remote(&self.addr, error));
        }

        debug!(bytes = line.len(), "Response received");
        Ok(response
            .result
            .as_ref()
            .map(from_dict)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// One-shot raw server answering with a fixed line
    async fn canned_server(reply: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut line = String::new();
            BufReader::new(reader).read_line(&mut line).await.unwrap();
            writer.write_all(reply.as_bytes()).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_empty_reply_is_no_response() {
        let addr = canned_server("").await;
        let client = JsonRpcClient::new(addr, Duration::from_secs(2));

        let err = client.call(&Message::new("x")).await.unwrap_err();
        assert!(matches!(err, TransportError::NoResponse { .. }));
    }

    #[tokio::test]
    async fn test_error_field_is_raised() {
        let addr = canned_server("{\"id\": \"1\", \"error\": \"boom\"}\n").await;
        let client = JsonRpcClient::new(addr, Duration::from_secs(2));

        let err = client.call(&Message::new("x")).await.unwrap_err();
        assert!(matches!(err, TransportError::Remote { ref message, .. } if message == "boom"));
    }

    #[tokio::test]
    async fn test_reply_is_decoded() {
        let addr = canned_server(
            "{\"id\": \"1\", \"result\": {\"user_input\": \"x\", \"story\": {\"text\": \"Done.\"}}}\n",
        )
        .await;
        let client = JsonRpcClient::new(addr, Duration::from_secs(2));

        let out = client.call(&Message::new("x")).await.unwrap();
        assert_eq!(out.story_text.as_deref(), Some("Done."));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let _hold = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = JsonRpcClient::new(addr, Duration::from_millis(100));
        let err = client.call(&Message::new("x")).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout { timeout_ms: 100, .. }));
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = JsonRpcClient::new(addr, Duration::from_secs(2));
        let err = client.call(&Message::new("x")).await.unwrap_err();
        assert!(err.is_unreachable());
    }
}
