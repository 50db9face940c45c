//! Binary-schema wire types
//!
//! Structured fields travel as JSON text in string slots; an empty slot means
//! the field is absent.

/// Pipeline message as carried by the gRPC binding
#[derive(Clone, PartialEq, prost::Message)]
pub struct PipelineMessage {
    #[prost(string, tag = "1")]
    pub user_input: String,
    #[prost(string, tag = "2")]
    pub story_text: String,
    #[prost(string, tag = "3")]
    pub analysis_json: String,
    #[prost(string, tag = "4")]
    pub image_concept_json: String,
    #[prost(string, tag = "5")]
    pub audio_script_json: String,
    #[prost(string, tag = "6")]
    pub translations_json: String,
    #[prost(string, tag = "7")]
    pub formatted_output_json: String,
    #[prost(string, tag = "8")]
    pub metadata_json: String,
    #[prost(string, tag = "9")]
    pub timestamps_json: String,
}

// story_pipeline.PipelineService { rpc Process(PipelineMessage) returns (PipelineMessage); }
include!(concat!(env!("OUT_DIR"), "/story_pipeline.PipelineService.rs"));
