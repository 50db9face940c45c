//! JsonRpcServer - hosts one stage behind the text protocol

use contracts::Stage;
use observability::{record_rpc_request, RpcOutcome};
use serde_json::Value;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, instrument, warn};

use super::RpcResponse;
use crate::codec::{from_dict, to_dict};
use crate::handler::run_guarded;
use crate::TransportError;

const TRANSPORT: &str = "json_rpc";

/// Longest request line read from one connection
const MAX_REQUEST_BYTES: u64 = 1024 * 1024;

/// Text-protocol stage server
pub struct JsonRpcServer {
    stage: Arc<dyn Stage>,
}

impl JsonRpcServer {
    pub fn new(stage: Arc<dyn Stage>) -> Self {
        Self { stage }
    }

    /// Serve until the process exits
    pub async fn serve(self, listener: TcpListener) -> Result<(), TransportError> {
        self.serve_with_shutdown(listener, std::future::pending())
            .await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Every connection runs on its own task; there is no admission limit.
    #[instrument(name = "json_rpc_serve", skip_all, fields(stage = %self.stage.name()))]
    pub async fn serve_with_shutdown<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), TransportError>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        info!(addr = %addr, "JSON-RPC server listening");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(addr = %addr, "JSON-RPC server shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!(error = %e, "Accept failed");
                            continue;
                        }
                    };

                    let stage = Arc::clone(&self.stage);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, stage).await {
                            warn!(peer = %peer, error = %e, "Connection failed");
                        }
                    });
                }
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    stage: Arc<dyn Stage>,
) -> Result<(), TransportError> {
    let (reader, mut writer) = stream.into_split();
    let mut line = String::new();
    // an oversized line is cut at the cap and then fails to parse
    BufReader::new(reader.take(MAX_REQUEST_BYTES))
        .read_line(&mut line)
        .await?;

    // EOF before any byte; a blank line still gets an invalid_json reply
    if line.is_empty() {
        debug!(peer = %peer, "Empty connection closed");
        return Ok(());
    }

    let response = respond(&line, stage).await;
    let mut payload = serde_json::to_vec(&response)?;
    payload.push(b'\n');

    writer.write_all(&payload).await?;
    writer.shutdown().await?;
    Ok(())
}

/// Build the reply for one request line
async fn respond(line: &str, stage: Arc<dyn Stage>) -> RpcResponse {
    let request = match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            record_rpc_request(TRANSPORT, RpcOutcome::InvalidRequest);
            return RpcResponse::error(Value::Null, "invalid_json: expected a JSON object");
        }
        Err(e) => {
            record_rpc_request(TRANSPORT, RpcOutcome::InvalidRequest);
            return RpcResponse::error(Value::Null, format!("invalid_json: {e}"));
        }
    };

    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let Some(params) = request.get("params").filter(|p| p.is_object()) else {
        record_rpc_request(TRANSPORT, RpcOutcome::InvalidRequest);
        return RpcResponse::error(id, "params must be a message object");
    };

    match run_guarded(stage, from_dict(params)).await {
        Ok(out) => {
            record_rpc_request(TRANSPORT, RpcOutcome::Ok);
            RpcResponse::ok(id, to_dict(&out))
        }
        Err(message) => {
            warn!(error = %message, "Stage returned error");
            record_rpc_request(TRANSPORT, RpcOutcome::Error);
            RpcResponse::error(id, message)
        }
    }
}
