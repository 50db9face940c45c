//! Stage trait - the single operation every stage exposes
//!
//! A stage takes the authoritative message and returns the new authoritative
//! message. Local stages, remote stubs and the parallel hub all implement it,
//! so the runner never needs to know which one it is calling.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{ContractError, Message};

/// Canonical stage names (registry keys and timestamp keys)
pub mod stage_names {
    pub const STORY_GENERATOR: &str = "service_a_story_generator";
    pub const STORY_ANALYZER: &str = "service_b_story_analyzer";
    pub const PARALLEL_HUB: &str = "service_c_parallel_hub";
    pub const IMAGE_CONCEPT: &str = "service_c1_image_concept";
    pub const AUDIO_SCRIPT: &str = "service_c2_audio_script";
    pub const TRANSLATION: &str = "service_c3_translation";
    pub const FORMATTING: &str = "service_c4_formatting";
    pub const AGGREGATOR: &str = "service_d_aggregator";

    /// Record spanning a whole pipeline run
    pub const MAIN_PROGRAM: &str = "main_program";

    /// The fixed top-level chain
    pub const CHAIN: [&str; 4] = [STORY_GENERATOR, STORY_ANALYZER, PARALLEL_HUB, AGGREGATOR];

    /// Every stage that can be hosted as a service
    pub const ALL: [&str; 8] = [
        STORY_GENERATOR,
        STORY_ANALYZER,
        IMAGE_CONCEPT,
        AUDIO_SCRIPT,
        TRANSLATION,
        FORMATTING,
        PARALLEL_HUB,
        AGGREGATOR,
    ];
}

/// Message-transforming stage
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name (used for timestamps, logging and metrics)
    fn name(&self) -> &str;

    /// Process a message and return the new authoritative message
    ///
    /// # Errors
    /// Returns a stage error when a precondition is unmet or processing fails
    async fn process(&self, message: Message) -> Result<Message, ContractError>;
}

/// Synchronous stage function
pub type StageFn = dyn Fn(Message) -> Result<Message, ContractError> + Send + Sync;

/// Adapter turning a pure function into a [`Stage`]
pub struct FnStage {
    name: String,
    func: Arc<StageFn>,
}

impl FnStage {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Message) -> Result<Message, ContractError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

#[async_trait]
impl Stage for FnStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, message: Message) -> Result<Message, ContractError> {
        (self.func)(message)
    }
}
