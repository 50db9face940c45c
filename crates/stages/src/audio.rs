//! Stage C2 - narration script

use async_trait::async_trait;
use contracts::{stage_names, AudioScript, ContractError, Message, Sentiment, Stage};
use serde_json::{json, Map};

use crate::text::round_to;

/// Narration speed in words per minute
const WORDS_PER_MINUTE: f64 = 140.0;
const EMPHASIS_KEYWORDS: &[&str] = &["discover", "find", "realize", "understand"];
const LONG_SENTENCE_WORDS: usize = 15;

fn intensity_words(sentiment: Sentiment) -> &'static [&'static str] {
    match sentiment {
        Sentiment::Positive => &["happy", "joy", "great"],
        Sentiment::Negative => &["sad", "fear", "dark"],
        Sentiment::Neutral => &[],
    }
}

/// Sentences whose letters-per-word (plus keyword bonus) exceed three
fn is_emphasized(sentence: &str) -> bool {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    let importance: usize = words
        .iter()
        .map(|word| {
            let lower = word.to_lowercase();
            let bonus = if EMPHASIS_KEYWORDS.iter().any(|k| lower.contains(k)) {
                5
            } else {
                0
            };
            word.chars().count() + bonus
        })
        .sum();
    importance > words.len() * 3
}

struct Script {
    narration: String,
    emphasis_points: usize,
    pause_points: usize,
    sentence_count: usize,
}

/// Mark up sentences with `[EMPHASIS]`, `[PAUSE]` and a closing `[FADE_OUT]`
fn build_script(story: &str) -> Script {
    let sentences: Vec<&str> = story.split(". ").collect();
    let last = sentences.len().saturating_sub(1);

    let mut lines = Vec::with_capacity(sentences.len());
    let (mut emphasis_points, mut pause_points) = (0, 0);

    for (i, raw) in sentences.iter().enumerate() {
        let sentence = raw.trim();
        if sentence.is_empty() {
            continue;
        }
        let needs_pause = sentence.split_whitespace().count() > LONG_SENTENCE_WORDS || i % 3 == 0;

        if is_emphasized(sentence) {
            lines.push(format!("[EMPHASIS] {sentence} [PAUSE]"));
            emphasis_points += 1;
            pause_points += 1;
        } else if i == last {
            lines.push(format!("{sentence} [FADE_OUT]"));
        } else if needs_pause {
            lines.push(format!("{sentence} [PAUSE]"));
            pause_points += 1;
        } else {
            lines.push(sentence.to_string());
        }
    }

    Script {
        narration: lines.join(" "),
        emphasis_points,
        pause_points,
        sentence_count: sentences.len(),
    }
}

/// Writes `audio_script`
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioScriptStage;

impl AudioScriptStage {
    pub fn new() -> Self {
        Self
    }

    pub fn narrate(&self, mut message: Message) -> Result<Message, ContractError> {
        let story = message.story_text.as_deref().unwrap_or_default();
        let words: Vec<&str> = story.split_whitespace().collect();
        let (sentiment, analyzed_words) = message
            .analysis
            .as_ref()
            .map(|a| (a.sentiment, Some(a.word_count)))
            .unwrap_or_default();

        let script = build_script(story);
        let word_count = analyzed_words.unwrap_or(words.len());
        let minutes = round_to(word_count as f64 / WORDS_PER_MINUTE, 1);

        let markers = intensity_words(sentiment);
        let intensity = words
            .iter()
            .filter(|w| {
                let lower = w.to_lowercase();
                markers.iter().any(|m| lower.contains(m))
            })
            .count();
        let mut tone = sentiment.to_string();
        if intensity as f64 > words.len() as f64 / 10.0 {
            tone.push_str(" (strong)");
        }

        let mut extra = Map::new();
        extra.insert("processing_passes".into(), json!(4));

        message.audio_script = Some(AudioScript {
            narration: script.narration,
            duration_estimate_minutes: minutes,
            duration_estimate_seconds: (minutes * 60.0) as u64,
            word_count,
            tone,
            emphasis_points: script.emphasis_points,
            pause_points: script.pause_points,
            sentence_count: script.sentence_count,
            extra,
        });
        Ok(message)
    }
}

#[async_trait]
impl Stage for AudioScriptStage {
    fn name(&self) -> &str {
        stage_names::AUDIO_SCRIPT
    }

    async fn process(&self, message: Message) -> Result<Message, ContractError> {
        self.narrate(message)
    }
}
