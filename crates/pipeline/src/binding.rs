//! StageBinding - one way of reaching a stage

use contracts::{stage_names, Message, PipelineBlueprint, Stage, TransportKind};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use transport::{RemoteClient, TransportError};

use crate::error::PipelineError;
use crate::hub::ParallelHub;

/// Local implementation or remote stub for a stage
#[derive(Clone)]
pub enum StageBinding {
    Local(Arc<dyn Stage>),
    Remote(RemoteClient),
}

impl StageBinding {
    pub fn local(stage: impl Stage + 'static) -> Self {
        Self::Local(Arc::new(stage))
    }

    pub fn remote(
        transport: TransportKind,
        addr: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        RemoteClient::new(transport, addr, timeout).map(Self::Remote)
    }

    pub fn transport(&self) -> TransportKind {
        match self {
            Self::Local(_) => TransportKind::Local,
            Self::Remote(client) => client.transport(),
        }
    }

    /// Invoke the stage and return the new authoritative message.
    ///
    /// A remote result is absorbed into the caller's message, so fields the
    /// remote left empty and the caller's own timestamp marks survive.
    #[instrument(
        name = "pipeline_invoke",
        skip(self, message),
        fields(transport = %self.transport())
    )]
    pub async fn invoke(&self, stage: &str, message: Message) -> Result<Message, PipelineError> {
        match self {
            Self::Local(local) => local
                .process(message)
                .await
                .map_err(|e| PipelineError::stage(stage, e)),
            Self::Remote(client) => {
                let remote = client
                    .call(&message)
                    .await
                    .map_err(|e| PipelineError::transport(stage, e))?;
                debug!(addr = client.addr(), "Remote stage answered");

                let mut merged = message;
                merged.absorb_remote(remote);
                Ok(merged)
            }
        }
    }
}

impl fmt::Debug for StageBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(stage) => f.debug_tuple("Local").field(&stage.name()).finish(),
            Self::Remote(client) => f.debug_tuple("Remote").field(client).finish(),
        }
    }
}

impl fmt::Display for StageBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(_) => f.write_str("local"),
            Self::Remote(client) => write!(f, "{}://{}", client.transport(), client.addr()),
        }
    }
}

/// Resolve how `name` is reached under the blueprint's mode
pub fn resolve_binding(
    name: &str,
    blueprint: &PipelineBlueprint,
) -> Result<StageBinding, PipelineError> {
    if blueprint.mode.is_remote() {
        let addr = blueprint
            .endpoint(name)
            .ok_or_else(|| PipelineError::MissingEndpoint {
                name: name.to_string(),
            })?;
        return StageBinding::remote(blueprint.mode, addr, blueprint.rpc_timeout())
            .map_err(|e| PipelineError::transport(name, e));
    }

    hosted_stage(name, blueprint).map(StageBinding::Local)
}

/// Stage a server process hosts for `name`.
///
/// Content stages are always local; the hub reaches its sub-stages through
/// the blueprint's mode.
pub fn hosted_stage(
    name: &str,
    blueprint: &PipelineBlueprint,
) -> Result<Arc<dyn Stage>, PipelineError> {
    if name == stage_names::PARALLEL_HUB {
        return Ok(Arc::new(ParallelHub::from_blueprint(blueprint)?));
    }
    stages::local_stage(name).ok_or_else(|| PipelineError::UnknownStage {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, FnStage};

    #[tokio::test]
    async fn test_local_invoke() {
        let binding = StageBinding::local(FnStage::new("a", |mut msg: Message| {
            msg.story_text = Some("told".into());
            Ok(msg)
        }));
        let out = binding.invoke("a", Message::new("x")).await.unwrap();
        assert_eq!(out.story_text.as_deref(), Some("told"));
        assert_eq!(binding.to_string(), "local");
    }

    #[tokio::test]
    async fn test_local_error_names_stage() {
        let binding = StageBinding::local(FnStage::new("b", |_msg: Message| {
            Err(ContractError::missing_input("b", "story_text"))
        }));
        let err = binding.invoke("b", Message::new("x")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Stage { ref stage, .. } if stage == "b"));
    }

    #[test]
    fn test_resolve_local_mode() {
        let bp = PipelineBlueprint::default();
        for name in stage_names::ALL {
            let binding = resolve_binding(name, &bp).unwrap();
            assert_eq!(binding.transport(), TransportKind::Local);
        }
        assert!(matches!(
            resolve_binding("service_x", &bp),
            Err(PipelineError::UnknownStage { .. })
        ));
    }

    #[test]
    fn test_resolve_remote_mode() {
        let mut bp = PipelineBlueprint {
            mode: TransportKind::Grpc,
            ..Default::default()
        };
        let binding = resolve_binding(stage_names::STORY_ANALYZER, &bp).unwrap();
        assert_eq!(binding.to_string(), "grpc://service-b:50052");

        bp.endpoints.remove(stage_names::AGGREGATOR);
        assert!(matches!(
            resolve_binding(stage_names::AGGREGATOR, &bp),
            Err(PipelineError::MissingEndpoint { .. })
        ));
    }
}
