//! Pipeline - sequential stage runner

use contracts::{stage_names, Message, PipelineBlueprint};
use observability::{record_stage_failure, record_stage_run};
use std::collections::HashMap;
use timeline::TimelineTracker;
use tracing::{error, info, instrument};

use crate::binding::{resolve_binding, StageBinding};
use crate::error::PipelineError;

/// Name -> binding registry executed one stage at a time
#[derive(Debug, Default)]
pub struct Pipeline {
    registry: HashMap<String, StageBinding>,
    tracker: TimelineTracker,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner with the top-level chain bound per the blueprint
    #[instrument(name = "pipeline_from_blueprint", skip(blueprint), fields(mode = %blueprint.mode))]
    pub fn from_blueprint(blueprint: &PipelineBlueprint) -> Result<Self, PipelineError> {
        let mut pipeline = Self::new();
        for name in stage_names::CHAIN {
            let binding = resolve_binding(name, blueprint)?;
            info!(stage = name, binding = %binding, "Stage bound");
            pipeline.register(name, binding);
        }
        Ok(pipeline)
    }

    /// Register (or replace) a stage binding
    pub fn register(&mut self, name: impl Into<String>, binding: StageBinding) -> &mut Self {
        self.registry.insert(name.into(), binding);
        self
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    pub fn binding(&self, name: &str) -> Option<&StageBinding> {
        self.registry.get(name)
    }

    /// Run the fixed A, B, C, D chain
    pub async fn run(&self, message: Message) -> Result<Message, PipelineError> {
        self.execute(message, &stage_names::CHAIN).await
    }

    /// Run `chain` in order against `message`.
    ///
    /// Every name is checked before the first stage runs. A failing stage
    /// aborts the chain; the error carries the message as it stood then.
    #[instrument(name = "pipeline_execute", skip(self, message, chain), fields(stages = chain.len()))]
    pub async fn execute(
        &self,
        mut message: Message,
        chain: &[&str],
    ) -> Result<Message, PipelineError> {
        let bindings = chain
            .iter()
            .map(|name| {
                self.registry
                    .get(*name)
                    .map(|binding| (*name, binding))
                    .ok_or_else(|| PipelineError::not_registered(*name))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (name, binding) in bindings {
            self.tracker.mark_received(&mut message, name);
            self.tracker.mark_started(&mut message, name);
            info!(stage = name, binding = %binding, "Running stage");

            message = match binding.invoke(name, message.clone()).await {
                Ok(out) => out,
                Err(e) => {
                    error!(stage = name, error = %e, "Stage failed, aborting pipeline");
                    record_stage_failure(name);
                    return Err(e.with_partial(message));
                }
            };

            let record = self.tracker.mark_completed(&mut message, name);
            if let Some(ms) = record.duration_ms() {
                record_stage_run(name, ms);
            }
        }

        Ok(message)
    }
}
