//! PipelineBlueprint - Config Loader output
//!
//! Describes how a pipeline run binds its stages: execution mode, remote
//! endpoints, RPC timeout and server listen settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::stage_names;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// How a stage is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// In-process call
    #[default]
    Local,
    /// Newline-delimited JSON over TCP
    JsonRpc,
    /// Protobuf over gRPC
    Grpc,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::JsonRpc => "json_rpc",
            Self::Grpc => "grpc",
        }
    }

    /// Whether stages are reached over the network
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Execution mode for every stage
    #[serde(default)]
    pub mode: TransportKind,

    /// Per-call timeout for remote stages
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,

    /// Stage name -> "host:port"
    #[serde(default = "default_endpoints")]
    pub endpoints: BTreeMap<String, String>,

    /// Listen settings for `serve`
    #[serde(default)]
    pub server: ServerConfig,
}

/// Stage server listen settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
        }
    }
}

fn default_rpc_timeout_ms() -> u64 {
    10_000
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

/// Compose-style defaults: one host per service, one port per stage
pub fn default_endpoints() -> BTreeMap<String, String> {
    [
        (stage_names::STORY_GENERATOR, "service-a:50051"),
        (stage_names::STORY_ANALYZER, "service-b:50052"),
        (stage_names::IMAGE_CONCEPT, "service-c1:50053"),
        (stage_names::AUDIO_SCRIPT, "service-c2:50054"),
        (stage_names::TRANSLATION, "service-c3:50055"),
        (stage_names::FORMATTING, "service-c4:50056"),
        (stage_names::PARALLEL_HUB, "service-c:50057"),
        (stage_names::AGGREGATOR, "service-d:50058"),
    ]
    .into_iter()
    .map(|(name, addr)| (name.to_string(), addr.to_string()))
    .collect()
}

impl Default for PipelineBlueprint {
    fn default() -> Self {
        Self {
            version: ConfigVersion::default(),
            mode: TransportKind::default(),
            rpc_timeout_ms: default_rpc_timeout_ms(),
            endpoints: default_endpoints(),
            server: ServerConfig::default(),
        }
    }
}

impl PipelineBlueprint {
    /// Remote call timeout
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    /// Endpoint configured for a stage
    pub fn endpoint(&self, stage_name: &str) -> Option<&str> {
        self.endpoints.get(stage_name).map(String::as_str)
    }

    /// Port part of a stage endpoint
    pub fn endpoint_port(&self, stage_name: &str) -> Option<u16> {
        self.endpoint(stage_name)
            .and_then(|addr| addr.rsplit_once(':'))
            .and_then(|(_, port)| port.parse().ok())
    }
}
