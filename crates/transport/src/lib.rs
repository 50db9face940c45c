//! # Transport
//!
//! Serialization boundary and RPC bindings for remote stages.
//!
//! - Codecs: dictionary form ([`to_dict`]/[`from_dict`]) and binary-schema
//!   form ([`to_proto`]/[`from_proto`])
//! - Text binding: [`JsonRpcServer`] / [`JsonRpcClient`]
//! - Schema binding: [`GrpcServer`] / [`GrpcClient`]
//! - [`RemoteClient`] and [`serve_stage`] pick a binding from a [`TransportKind`]
//!
//! [`TransportKind`]: contracts::TransportKind

mod client;
mod codec;
mod error;
mod grpc;
mod handler;
mod json_rpc;
pub mod proto;
mod server;
mod tracked;

pub use client::RemoteClient;
pub use codec::{from_dict, from_proto, timestamps_from_value, timestamps_to_dict, to_dict, to_proto};
pub use error::TransportError;
pub use grpc::{GrpcClient, GrpcServer, GrpcStageService};
pub use json_rpc::{JsonRpcClient, JsonRpcServer, RpcRequest, RpcResponse, PROCESS_METHOD};
pub use server::serve_stage;
pub use tracked::TrackedStage;
