//! Message - the unit of work threaded through every stage
//!
//! Also holds the two merge rules used when results come back from another
//! task or another process.

use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Analysis, AudioScript, ImageConcept};

/// Current wall-clock time in epoch seconds
pub fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// One stage's execution window
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimestampRecord {
    /// Stage name (copy of the map key, used when rendering)
    pub stage_name: String,

    /// When the request reached the stage
    pub received_at: Option<f64>,

    /// When processing started
    pub started_at: Option<f64>,

    /// When processing completed
    pub completed_at: Option<f64>,
}

impl TimestampRecord {
    /// Create an empty record for a stage
    pub fn new(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            ..Default::default()
        }
    }

    /// Processing duration in milliseconds (needs start and completion)
    pub fn duration_ms(&self) -> Option<f64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start) * 1000.0),
            _ => None,
        }
    }
}

/// Message passed between stages
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    /// Original user prompt
    pub user_input: String,

    pub story_text: Option<String>,
    pub analysis: Option<Analysis>,

    // Parallel hub outputs
    pub image_concept: Option<ImageConcept>,
    pub audio_script: Option<AudioScript>,
    /// Language -> translated text
    pub translations: Option<BTreeMap<String, String>>,
    /// Format -> rendered document
    pub formatted_output: Option<BTreeMap<String, String>>,

    /// Free-form side channel
    pub metadata: BTreeMap<String, Value>,

    /// Stage name -> execution window
    pub timestamps: BTreeMap<String, TimestampRecord>,
}

/// Hub sub-stage kind, each owning exactly one output field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    ImageConcept,
    AudioScript,
    Translation,
    Formatting,
}

impl BranchKind {
    /// All kinds in dispatch order
    pub const ALL: [BranchKind; 4] = [
        BranchKind::ImageConcept,
        BranchKind::AudioScript,
        BranchKind::Translation,
        BranchKind::Formatting,
    ];

    /// Canonical stage name of the sub-stage
    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::ImageConcept => crate::stage_names::IMAGE_CONCEPT,
            Self::AudioScript => crate::stage_names::AUDIO_SCRIPT,
            Self::Translation => crate::stage_names::TRANSLATION,
            Self::Formatting => crate::stage_names::FORMATTING,
        }
    }

    /// Name of the message field the sub-stage writes
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::ImageConcept => "image_concept",
            Self::AudioScript => "audio_script",
            Self::Translation => "translations",
            Self::Formatting => "formatted_output",
        }
    }
}

impl Message {
    /// Create a message for a new pipeline run
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            ..Default::default()
        }
    }

    /// Get or create the timestamp record for a stage
    pub fn timestamp_mut(&mut self, stage_name: &str) -> &mut TimestampRecord {
        self.timestamps
            .entry(stage_name.to_string())
            .or_insert_with(|| TimestampRecord::new(stage_name))
    }

    /// Get the timestamp record for a stage
    pub fn timestamp(&self, stage_name: &str) -> Option<&TimestampRecord> {
        self.timestamps.get(stage_name)
    }

    /// Whether the output field of a hub sub-stage is populated
    pub fn has_branch_output(&self, kind: BranchKind) -> bool {
        match kind {
            BranchKind::ImageConcept => self.image_concept.is_some(),
            BranchKind::AudioScript => self.audio_script.is_some(),
            BranchKind::Translation => self.translations.is_some(),
            BranchKind::Formatting => self.formatted_output.is_some(),
        }
    }

    /// Number of whitespace-separated words in the story
    pub fn story_word_count(&self) -> usize {
        self.story_text
            .as_deref()
            .map(|s| s.split_whitespace().count())
            .unwrap_or(0)
    }

    /// Earliest start to latest completion across all records, in ms
    pub fn total_duration_ms(&self) -> Option<f64> {
        let start = self
            .timestamps
            .values()
            .filter_map(|ts| ts.started_at)
            .reduce(f64::min)?;
        let end = self
            .timestamps
            .values()
            .filter_map(|ts| ts.completed_at)
            .reduce(f64::max)?;
        Some((end - start) * 1000.0)
    }

    /// Add timestamp records for stages this message does not know yet.
    ///
    /// Existing records always win, which makes the union idempotent and
    /// independent of arrival order.
    pub fn union_timestamps(&mut self, other: BTreeMap<String, TimestampRecord>) {
        for (name, record) in other {
            self.timestamps.entry(name).or_insert(record);
        }
    }

    /// Merge the result of a hub sub-stage.
    ///
    /// Only the field owned by `kind` is taken (when present). Metadata is
    /// key-unioned with the branch winning; timestamps the shared message
    /// already holds are kept.
    pub fn merge_branch(&mut self, kind: BranchKind, branch: Message) {
        let Message {
            image_concept,
            audio_script,
            translations,
            formatted_output,
            metadata,
            timestamps,
            ..
        } = branch;

        match kind {
            BranchKind::ImageConcept => {
                if image_concept.is_some() {
                    self.image_concept = image_concept;
                }
            }
            BranchKind::AudioScript => {
                if audio_script.is_some() {
                    self.audio_script = audio_script;
                }
            }
            BranchKind::Translation => {
                if translations.is_some() {
                    self.translations = translations;
                }
            }
            BranchKind::Formatting => {
                if formatted_output.is_some() {
                    self.formatted_output = formatted_output;
                }
            }
        }

        self.metadata.extend(metadata);
        self.union_timestamps(timestamps);
    }

    /// Merge a message returned by a remote top-level stage.
    ///
    /// Non-null remote fields overwrite, metadata is key-unioned with the
    /// remote winning, timestamps are unioned with the local side winning so
    /// the caller's own marks for the stage survive.
    pub fn absorb_remote(&mut self, remote: Message) {
        let Message {
            story_text,
            analysis,
            image_concept,
            audio_script,
            translations,
            formatted_output,
            metadata,
            timestamps,
            ..
        } = remote;

        if story_text.is_some() {
            self.story_text = story_text;
        }
        if analysis.is_some() {
            self.analysis = analysis;
        }
        if image_concept.is_some() {
            self.image_concept = image_concept;
        }
        if audio_script.is_some() {
            self.audio_script = audio_script;
        }
        if translations.is_some() {
            self.translations = translations;
        }
        if formatted_output.is_some() {
            self.formatted_output = formatted_output;
        }

        self.metadata.extend(metadata);
        self.union_timestamps(timestamps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, start: f64, end: f64) -> TimestampRecord {
        TimestampRecord {
            stage_name: name.to_string(),
            received_at: Some(start),
            started_at: Some(start),
            completed_at: Some(end),
        }
    }

    fn branch_result(kind: BranchKind) -> Message {
        let mut msg = Message::new("prompt");
        match kind {
            BranchKind::ImageConcept => {
                msg.image_concept = Some(ImageConcept {
                    scene_description: "nebula".to_string(),
                    ..Default::default()
                })
            }
            BranchKind::AudioScript => {
                msg.audio_script = Some(AudioScript {
                    narration: "Once [PAUSE]".to_string(),
                    ..Default::default()
                })
            }
            BranchKind::Translation => {
                msg.translations = Some(BTreeMap::from([(
                    "spanish".to_string(),
                    "Había una vez".to_string(),
                )]))
            }
            BranchKind::Formatting => {
                msg.formatted_output = Some(BTreeMap::from([(
                    "markdown".to_string(),
                    "# Story".to_string(),
                )]))
            }
        }
        msg.timestamps.insert(
            kind.stage_name().to_string(),
            record(kind.stage_name(), 10.0, 11.0),
        );
        msg
    }

    #[test]
    fn test_duration_requires_start_and_end() {
        let mut ts = TimestampRecord::new("a");
        ts.completed_at = Some(2.0);
        assert_eq!(ts.duration_ms(), None);
        ts.started_at = Some(1.5);
        assert_eq!(ts.duration_ms(), Some(500.0));
    }

    #[test]
    fn test_total_duration_spans_all_records() {
        let mut msg = Message::new("x");
        msg.timestamps.insert("a".into(), record("a", 1.0, 2.0));
        msg.timestamps.insert("b".into(), record("b", 2.0, 4.5));
        assert_eq!(msg.total_duration_ms(), Some(3500.0));
        assert_eq!(Message::new("y").total_duration_ms(), None);
    }

    #[test]
    fn test_merge_branch_is_idempotent() {
        let mut once = Message::new("prompt");
        once.merge_branch(BranchKind::Translation, branch_result(BranchKind::Translation));

        let mut twice = once.clone();
        twice.merge_branch(BranchKind::Translation, branch_result(BranchKind::Translation));

        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_branch_is_commutative() {
        let mut forward = Message::new("prompt");
        for kind in BranchKind::ALL {
            forward.merge_branch(kind, branch_result(kind));
        }

        let mut backward = Message::new("prompt");
        for kind in BranchKind::ALL.iter().rev() {
            backward.merge_branch(*kind, branch_result(*kind));
        }

        assert_eq!(forward, backward);
        for kind in BranchKind::ALL {
            assert!(forward.has_branch_output(kind));
        }
    }

    #[test]
    fn test_merge_branch_takes_only_owned_field() {
        let mut shared = Message::new("prompt");
        let mut stray = branch_result(BranchKind::ImageConcept);
        stray.story_text = Some("rewritten".to_string());
        stray.translations = Some(BTreeMap::new());

        shared.merge_branch(BranchKind::ImageConcept, stray);

        assert!(shared.image_concept.is_some());
        assert!(shared.story_text.is_none());
        assert!(shared.translations.is_none());
    }

    #[test]
    fn test_merge_branch_metadata_last_writer_wins() {
        let mut shared = Message::new("prompt");
        shared.metadata.insert("theme".into(), json!("space"));
        shared.metadata.insert("execution_mode".into(), json!("local"));

        let mut branch = branch_result(BranchKind::Translation);
        branch.metadata.insert("theme".into(), json!("rewritten"));
        branch
            .metadata
            .insert("spanish_translation_metadata".into(), json!({"replacement_count": 2}));

        shared.merge_branch(BranchKind::Translation, branch);

        assert_eq!(shared.metadata["theme"], json!("rewritten"));
        assert_eq!(shared.metadata["execution_mode"], json!("local"));
        assert_eq!(
            shared.metadata["spanish_translation_metadata"]["replacement_count"],
            2
        );
    }

    #[test]
    fn test_merge_branch_keeps_existing_timestamp() {
        let mut shared = Message::new("prompt");
        let name = BranchKind::AudioScript.stage_name();
        shared
            .timestamps
            .insert(name.to_string(), record(name, 1.0, 2.0));

        shared.merge_branch(BranchKind::AudioScript, branch_result(BranchKind::AudioScript));

        assert_eq!(shared.timestamps[name].started_at, Some(1.0));
    }

    #[test]
    fn test_absorb_remote_asymmetry() {
        let mut local = Message::new("prompt");
        local.story_text = Some("local story".to_string());
        local.metadata.insert("theme".into(), json!("space"));
        local.metadata.insert("keep".into(), json!(1));
        local
            .timestamps
            .insert("stage".into(), record("stage", 1.0, 2.0));

        let mut remote = Message::new("prompt");
        remote.story_text = Some("remote story".to_string());
        remote.metadata.insert("theme".into(), json!("robots"));
        remote
            .timestamps
            .insert("stage".into(), record("stage", 5.0, 6.0));
        remote
            .timestamps
            .insert("remote_only".into(), record("remote_only", 5.0, 6.0));

        local.absorb_remote(remote);

        assert_eq!(local.story_text.as_deref(), Some("remote story"));
        assert_eq!(local.metadata["theme"], json!("robots"));
        assert_eq!(local.metadata["keep"], json!(1));
        assert_eq!(local.timestamps["stage"].started_at, Some(1.0));
        assert!(local.timestamps.contains_key("remote_only"));
    }

    #[test]
    fn test_absorb_remote_keeps_local_fields_when_remote_empty() {
        let mut local = Message::new("prompt");
        local.story_text = Some("story".to_string());

        local.absorb_remote(Message::new("prompt"));

        assert_eq!(local.story_text.as_deref(), Some("story"));
    }
}
