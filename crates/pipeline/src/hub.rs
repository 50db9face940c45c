//! ParallelHub - fan-out to the four content sub-stages
//!
//! Every worker gets its own copy of the message as it stood when the hub
//! started. Results come back over the `JoinSet` and are merged by the hub
//! task alone, in completion order, so no shared state needs a lock.

use async_trait::async_trait;
use contracts::{stage_names, BranchKind, ContractError, Message, PipelineBlueprint, Stage};
use observability::{record_hub_degraded, record_stage_run};
use timeline::TimelineTracker;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::binding::{resolve_binding, StageBinding};
use crate::error::PipelineError;

/// Stage C: runs C1..C4 concurrently and merges their fields
#[derive(Debug, Clone)]
pub struct ParallelHub {
    branches: [(BranchKind, StageBinding); 4],
    tracker: TimelineTracker,
}

impl ParallelHub {
    /// Hub over explicit bindings
    pub fn new(
        image_concept: StageBinding,
        audio_script: StageBinding,
        translation: StageBinding,
        formatting: StageBinding,
    ) -> Self {
        Self {
            branches: [
                (BranchKind::ImageConcept, image_concept),
                (BranchKind::AudioScript, audio_script),
                (BranchKind::Translation, translation),
                (BranchKind::Formatting, formatting),
            ],
            tracker: TimelineTracker::new(),
        }
    }

    /// Hub with every sub-stage in-process
    pub fn local() -> Self {
        Self::new(
            StageBinding::local(stages::ImageConceptStage::new()),
            StageBinding::local(stages::AudioScriptStage::new()),
            StageBinding::local(stages::TranslationStage::new()),
            StageBinding::local(stages::FormattingStage::new()),
        )
    }

    /// Hub whose sub-stages follow the blueprint's mode
    pub fn from_blueprint(blueprint: &PipelineBlueprint) -> Result<Self, PipelineError> {
        Ok(Self::new(
            resolve_binding(stage_names::IMAGE_CONCEPT, blueprint)?,
            resolve_binding(stage_names::AUDIO_SCRIPT, blueprint)?,
            resolve_binding(stage_names::TRANSLATION, blueprint)?,
            resolve_binding(stage_names::FORMATTING, blueprint)?,
        ))
    }

    /// Replace one sub-stage binding
    pub fn with_binding(mut self, kind: BranchKind, binding: StageBinding) -> Self {
        for (branch, slot) in self.branches.iter_mut() {
            if *branch == kind {
                *slot = binding;
                break;
            }
        }
        self
    }

    /// Run all four sub-stages and merge their results. Never fails.
    #[instrument(name = "hub_fan_out", skip(self, message))]
    pub async fn fan_out(&self, message: Message) -> Message {
        let mut shared = message;
        self.tracker
            .mark_started(&mut shared, stage_names::PARALLEL_HUB);

        let mut workers = JoinSet::new();
        for (kind, binding) in &self.branches {
            let kind = *kind;
            let binding = binding.clone();
            let snapshot = shared.clone();
            let tracker = self.tracker;
            workers.spawn(async move { (kind, run_branch(tracker, kind, binding, snapshot).await) });
        }

        let mut merged = 0;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((kind, branch)) => {
                    debug!(stage = kind.stage_name(), "Merging sub-stage result");
                    shared.merge_branch(kind, branch);
                    merged += 1;
                }
                Err(e) => error!(error = %e, "Hub worker lost"),
            }
        }

        self.tracker
            .mark_completed(&mut shared, stage_names::PARALLEL_HUB);

        let populated = BranchKind::ALL
            .iter()
            .filter(|kind| shared.has_branch_output(**kind))
            .count();
        info!(merged, populated, "Parallel hub finished");
        shared
    }
}

/// One worker: mark, invoke, degrade to the snapshot on failure, mark done
async fn run_branch(
    tracker: TimelineTracker,
    kind: BranchKind,
    binding: StageBinding,
    mut input: Message,
) -> Message {
    let name = kind.stage_name();
    tracker.mark_received(&mut input, name);
    tracker.mark_started(&mut input, name);

    let fallback = input.clone();
    let call = tokio::spawn(async move { binding.invoke(name, input).await });

    let mut output = match call.await {
        Ok(Ok(out)) => out,
        Ok(Err(e)) => {
            warn!(stage = name, error = %e, "Sub-stage failed, keeping input snapshot");
            record_hub_degraded(name);
            fallback
        }
        Err(e) => {
            error!(stage = name, error = %e, "Sub-stage panicked, keeping input snapshot");
            record_hub_degraded(name);
            fallback
        }
    };

    if let Some(ms) = tracker.mark_completed(&mut output, name).duration_ms() {
        record_stage_run(name, ms);
    }
    output
}

#[async_trait]
impl Stage for ParallelHub {
    fn name(&self) -> &str {
        stage_names::PARALLEL_HUB
    }

    async fn process(&self, message: Message) -> Result<Message, ContractError> {
        Ok(self.fan_out(message).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{FnStage, ImageConcept};
    use serde_json::json;
    use std::time::Duration;

    fn story_message() -> Message {
        let mut msg = Message::new("A space adventure about robots");
        msg.story_text = Some("Rover and Aria found a hidden station in space.".into());
        msg
    }

    fn failing(name: &'static str) -> StageBinding {
        StageBinding::local(FnStage::new(name, move |_msg: Message| {
            Err(ContractError::stage_failed(name, "boom"))
        }))
    }

    #[tokio::test]
    async fn test_local_hub_populates_all_fields() {
        let out = ParallelHub::local().fan_out(story_message()).await;

        for kind in BranchKind::ALL {
            assert!(out.has_branch_output(kind), "{} missing", kind.field_name());
            let ts = out.timestamp(kind.stage_name()).unwrap();
            assert!(ts.duration_ms().is_some());
        }
        let hub = out.timestamp(stage_names::PARALLEL_HUB).unwrap();
        assert!(hub.completed_at.is_some());
        assert!(out.metadata.contains_key("formatting_metadata"));
        assert!(out.metadata.contains_key("spanish_translation_metadata"));
    }

    #[tokio::test]
    async fn test_failed_branch_is_isolated() {
        let hub = ParallelHub::local()
            .with_binding(BranchKind::Translation, failing(stage_names::TRANSLATION));

        let out = hub.fan_out(story_message()).await;

        assert!(out.translations.is_none());
        assert!(out.image_concept.is_some());
        assert!(out.audio_script.is_some());
        assert!(out.formatted_output.is_some());
        // degraded branch still reports its window
        let ts = out.timestamp(stage_names::TRANSLATION).unwrap();
        assert!(ts.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_panicking_branch_is_isolated() {
        let panicking = StageBinding::local(FnStage::new(
            stage_names::AUDIO_SCRIPT,
            |_msg: Message| -> Result<Message, ContractError> { panic!("worker blew up") },
        ));
        let hub = ParallelHub::local().with_binding(BranchKind::AudioScript, panicking);

        let out = hub.fan_out(story_message()).await;
        assert!(out.audio_script.is_none());
        assert!(out.image_concept.is_some());
        assert!(out.translations.is_some());
    }

    #[tokio::test]
    async fn test_unreachable_remote_branch_degrades() {
        // bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let remote = StageBinding::remote(
            contracts::TransportKind::JsonRpc,
            addr,
            Duration::from_millis(500),
        )
        .unwrap();
        let hub = ParallelHub::local().with_binding(BranchKind::ImageConcept, remote);

        let out = hub.fan_out(story_message()).await;
        assert!(out.image_concept.is_none());
        assert!(out.formatted_output.is_some());
    }

    #[tokio::test]
    async fn test_branches_see_only_the_snapshot() {
        let writer = StageBinding::local(FnStage::new(stage_names::IMAGE_CONCEPT, |mut msg: Message| {
            msg.image_concept = Some(ImageConcept::default());
            msg.metadata.insert("probe".into(), json!("from_c1"));
            Ok(msg)
        }));
        let observer = StageBinding::local(FnStage::new(stage_names::FORMATTING, |mut msg: Message| {
            // give C1 time to finish first
            std::thread::sleep(Duration::from_millis(50));
            let seen = msg.image_concept.is_some() || msg.metadata.contains_key("probe");
            msg.metadata.insert("c4_saw_sibling".into(), json!(seen));
            Ok(msg)
        }));
        let hub = ParallelHub::local()
            .with_binding(BranchKind::ImageConcept, writer)
            .with_binding(BranchKind::Formatting, observer);

        let out = hub.fan_out(story_message()).await;
        assert_eq!(out.metadata["c4_saw_sibling"], false);
        assert_eq!(out.metadata["probe"], "from_c1");
        assert!(out.image_concept.is_some());
    }

    #[tokio::test]
    async fn test_existing_fields_survive_degraded_branch() {
        let mut msg = story_message();
        msg.metadata.insert("theme".into(), json!("space"));
        let hub = ParallelHub::local()
            .with_binding(BranchKind::ImageConcept, failing(stage_names::IMAGE_CONCEPT));

        let out = hub.fan_out(msg).await;
        assert_eq!(out.metadata["theme"], "space");
        assert_eq!(out.story_text.as_deref(), Some("Rover and Aria found a hidden station in space."));
    }
}
