//! gRPC binding (`story_pipeline.PipelineService/Process`)

mod client;
mod server;

pub use client::GrpcClient;
pub use server::{GrpcServer, GrpcStageService};
