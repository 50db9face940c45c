//! Typed stage payloads
//!
//! Each structured field of a [`Message`](crate::Message) is written by exactly
//! one stage. Known keys are typed; anything else survives in `extra` so a
//! newer remote stage can add keys without breaking older readers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Overall tone of a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Story analysis (written by the analyzer stage)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub avg_word_length: f64,

    /// Unknown keys (forward compatibility)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Visual concept for an illustration (written by the image stage)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageConcept {
    pub scene_description: String,
    #[serde(default)]
    pub color_palette: Vec<String>,
    pub mood: String,
    #[serde(default)]
    pub key_elements: Vec<String>,
    pub style: String,

    /// Unknown keys (forward compatibility)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Narration script (written by the audio stage)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioScript {
    pub narration: String,
    pub duration_estimate_minutes: f64,
    pub duration_estimate_seconds: u64,
    pub word_count: usize,
    pub tone: String,
    #[serde(default)]
    pub emphasis_points: usize,
    #[serde(default)]
    pub pause_points: usize,
    #[serde(default)]
    pub sentence_count: usize,

    /// Unknown keys (forward compatibility)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_wire_names() {
        let json = serde_json::to_string(&Sentiment::Positive).unwrap();
        assert_eq!(json, "\"positive\"");
        let back: Sentiment = serde_json::from_str("\"negative\"").unwrap();
        assert_eq!(back, Sentiment::Negative);
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let raw = serde_json::json!({
            "scene_description": "asteroid field",
            "color_palette": ["silver"],
            "mood": "contemplative exploration",
            "key_elements": [],
            "style": "digital art",
            "visual_elements_detected": 12
        });
        let concept: ImageConcept = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(concept.extra["visual_elements_detected"], 12);
        assert_eq!(serde_json::to_value(&concept).unwrap(), raw);
    }

    #[test]
    fn test_analysis_rejects_wrong_shape() {
        let raw = serde_json::json!({ "word_count": "many" });
        assert!(serde_json::from_value::<Analysis>(raw).is_err());
    }
}
