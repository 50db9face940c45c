//! # Stages
//!
//! Local implementations of every story stage.
//!
//! | Stage | Writes |
//! |-------|--------|
//! | A `StoryGenerator` | `story_text`, theme/characters metadata |
//! | B `StoryAnalyzer` | `analysis` (requires `story_text`) |
//! | C1 `ImageConceptStage` | `image_concept` |
//! | C2 `AudioScriptStage` | `audio_script` |
//! | C3 `TranslationStage` | `translations` |
//! | C4 `FormattingStage` | `formatted_output` |
//! | D `Aggregator` | `summary` / `statistics` metadata |
//!
//! The parallel hub (C) lives in the `pipeline` crate since it dispatches to
//! stage bindings rather than computing anything itself.
//!
//! ## Usage Example
//!
//! ```ignore
//! use stages::local_stage;
//! use contracts::{stage_names, Message};
//!
//! let generator = local_stage(stage_names::STORY_GENERATOR).unwrap();
//! let message = generator.process(Message::new("A space adventure")).await?;
//! ```

mod aggregator;
mod analyzer;
mod audio;
mod format;
mod formatting;
mod generator;
mod image;
mod story;
mod text;
mod translation;

use contracts::{stage_names, Stage};
use std::sync::Arc;

// Re-exports
pub use aggregator::Aggregator;
pub use analyzer::StoryAnalyzer;
pub use audio::AudioScriptStage;
pub use format::{format_html, format_markdown};
pub use formatting::{story_title, FormattingStage};
pub use generator::StoryGenerator;
pub use image::ImageConceptStage;
pub use story::{
    character_names, extract_theme, generate_story, generate_with_characters, GeneratedStory,
    StoryLength, Theme, THEMES,
};
pub use text::{
    analyze_sentiment, avg_word_length, count_paragraphs, count_sentences, count_words,
    extract_characters, extract_keywords,
};
pub use translation::{TranslationStage, LANGUAGES};

/// Local implementation of a named stage
///
/// Returns `None` for the parallel hub and unknown names.
pub fn local_stage(name: &str) -> Option<Arc<dyn Stage>> {
    let stage: Arc<dyn Stage> = match name {
        stage_names::STORY_GENERATOR => Arc::new(StoryGenerator::new()),
        stage_names::STORY_ANALYZER => Arc::new(StoryAnalyzer::new()),
        stage_names::IMAGE_CONCEPT => Arc::new(ImageConceptStage::new()),
        stage_names::AUDIO_SCRIPT => Arc::new(AudioScriptStage::new()),
        stage_names::TRANSLATION => Arc::new(TranslationStage::new()),
        stage_names::FORMATTING => Arc::new(FormattingStage::new()),
        stage_names::AGGREGATOR => Arc::new(Aggregator::new()),
        _ => return None,
    };
    Some(stage)
}
