//! Pipeline error types

use contracts::{ContractError, Message};
use thiserror::Error;
use transport::TransportError;

/// Errors raised while binding or executing a stage chain
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Chain names a stage the runner does not know
    #[error("stage not registered: `{name}`")]
    StageNotRegistered { name: String },

    /// No local implementation exists for the name
    #[error("no local implementation for stage '{name}'")]
    UnknownStage { name: String },

    /// Remote mode without an address for the stage
    #[error("no endpoint configured for remote stage '{name}'")]
    MissingEndpoint { name: String },

    /// Stage logic failed
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: ContractError,
        partial: Option<Box<Message>>,
    },

    /// Remote call failed
    #[error("remote stage '{stage}' failed: {source}")]
    Transport {
        stage: String,
        #[source]
        source: TransportError,
        partial: Option<Box<Message>>,
    },
}

impl PipelineError {
    pub fn not_registered(name: impl Into<String>) -> Self {
        Self::StageNotRegistered { name: name.into() }
    }

    pub fn stage(stage: impl Into<String>, source: ContractError) -> Self {
        Self::Stage {
            stage: stage.into(),
            source,
            partial: None,
        }
    }

    pub fn transport(stage: impl Into<String>, source: TransportError) -> Self {
        Self::Transport {
            stage: stage.into(),
            source,
            partial: None,
        }
    }

    /// Attach the message as it stood when the stage failed
    pub fn with_partial(mut self, message: Message) -> Self {
        if let Self::Stage { partial, .. } | Self::Transport { partial, .. } = &mut self {
            *partial = Some(Box::new(message));
        }
        self
    }

    /// Message state at the point of failure, if any stage had run
    pub fn partial(&self) -> Option<&Message> {
        match self {
            Self::Stage { partial, .. } | Self::Transport { partial, .. } => partial.as_deref(),
            _ => None,
        }
    }
}
