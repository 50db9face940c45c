//! Stage B - story analyzer

use async_trait::async_trait;
use contracts::{stage_names, Analysis, ContractError, Message, Stage};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use tracing::debug;

use crate::text::{
    analyze_sentiment, avg_word_length, count_paragraphs, count_sentences, count_words,
    extract_characters, extract_keywords,
};

const KEYWORD_COUNT: usize = 5;

/// Writes `analysis`; requires `story_text`
#[derive(Debug, Clone, Copy, Default)]
pub struct StoryAnalyzer;

impl StoryAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, mut message: Message) -> Result<Message, ContractError> {
        let text = message
            .story_text
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ContractError::missing_input(stage_names::STORY_ANALYZER, "story_text"))?;

        let known = known_characters(&message.metadata);

        let mut extra = Map::new();
        extra.insert("processing_metadata".into(), processing_metadata(text));

        let analysis = Analysis {
            word_count: count_words(text),
            sentence_count: count_sentences(text),
            paragraph_count: count_paragraphs(text),
            sentiment: analyze_sentiment(text),
            keywords: extract_keywords(text, KEYWORD_COUNT),
            characters: extract_characters(text, &known),
            avg_word_length: avg_word_length(text),
            extra,
        };

        debug!(
            words = analysis.word_count,
            sentiment = %analysis.sentiment,
            "Story analyzed"
        );

        message.analysis = Some(analysis);
        Ok(message)
    }
}

fn known_characters(metadata: &std::collections::BTreeMap<String, Value>) -> Vec<String> {
    metadata
        .get("characters")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn processing_metadata(text: &str) -> Value {
    let distinct_words: HashSet<String> = text
        .split_whitespace()
        .map(|w| {
            w.to_lowercase()
                .trim_matches(|c: char| ".,!?;:()[]{}\"'".contains(c))
                .to_string()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let distinct_letters: HashSet<char> = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();

    json!({
        "word_frequency_analysis": distinct_words.len(),
        "character_analysis_count": distinct_letters.len(),
    })
}

#[async_trait]
impl Stage for StoryAnalyzer {
    fn name(&self) -> &str {
        stage_names::STORY_ANALYZER
    }

    async fn process(&self, message: Message) -> Result<Message, ContractError> {
        self.analyze(message)
    }
}
