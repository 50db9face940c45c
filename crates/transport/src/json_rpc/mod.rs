//! Newline-delimited JSON RPC over TCP
//!
//! One exchange per connection:
//!
//! ```text
//! -> {"id": "1", "method": "process", "params": <message dict>}\n
//! <- {"id": "1", "result": <message dict>}\n      or {"id": "1", "error": "..."}\n
//! ```

mod client;
mod server;

pub use client::JsonRpcClient;
pub use server::JsonRpcServer;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method name sent by the client
pub const PROCESS_METHOD: &str = "process";

/// Request line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn process(params: Value) -> Self {
        Self {
            id: Value::String("1".to_string()),
            method: PROCESS_METHOD.to_string(),
            params,
        }
    }
}

/// Response line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RpcResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}
