//! Stage D - final aggregation

use async_trait::async_trait;
use contracts::{stage_names, ContractError, Message, Stage};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Presence of every component the pipeline should have produced
fn validation(message: &Message) -> Vec<(&'static str, bool)> {
    vec![
        ("story_text", message.story_text.is_some()),
        ("analysis", message.analysis.is_some()),
        ("image_concept", message.image_concept.is_some()),
        ("audio_script", message.audio_script.is_some()),
        ("translations", message.translations.is_some()),
        ("formatted_output", message.formatted_output.is_some()),
    ]
}

/// Writes `summary` (always) and `statistics` (when analysis exists) metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, mut message: Message) -> Result<Message, ContractError> {
        let checks = validation(&message);
        let received = checks.iter().filter(|(_, ok)| *ok).count();
        let total = checks.len();
        let validation: Map<String, Value> = checks
            .into_iter()
            .map(|(name, ok)| (name.to_string(), Value::Bool(ok)))
            .collect();

        debug!(received, total, "Components aggregated");

        message.metadata.insert(
            "summary".into(),
            json!({
                "pipeline_complete": received == total,
                "components_received": received,
                "total_components": total,
                "validation": validation,
            }),
        );

        if let Some(analysis) = &message.analysis {
            let statistics = json!({
                "word_count": analysis.word_count,
                "sentence_count": analysis.sentence_count,
                "paragraph_count": analysis.paragraph_count,
                "sentiment": analysis.sentiment,
                "translation_count": message.translations.as_ref().map_or(0, |t| t.len()),
                "formats_available": message
                    .formatted_output
                    .as_ref()
                    .map(|f| f.keys().cloned().collect::<Vec<_>>())
                    .unwrap_or_default(),
            });
            message.metadata.insert("statistics".into(), statistics);
        }

        Ok(message)
    }
}

#[async_trait]
impl Stage for Aggregator {
    fn name(&self) -> &str {
        stage_names::AGGREGATOR
    }

    async fn process(&self, message: Message) -> Result<Message, ContractError> {
        self.aggregate(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Analysis, Sentiment};
    use std::collections::BTreeMap;

    #[test]
    fn test_incomplete_pipeline() {
        let mut msg = Message::new("x");
        msg.story_text = Some("story".into());

        let out = Aggregator::new().aggregate(msg).unwrap();
        let summary = &out.metadata["summary"];

        assert_eq!(summary["pipeline_complete"], false);
        assert_eq!(summary["components_received"], 1);
        assert_eq!(summary["total_components"], 6);
        assert_eq!(summary["validation"]["analysis"], false);
        assert!(!out.metadata.contains_key("statistics"));
    }

    #[test]
    fn test_statistics_from_analysis() {
        let mut msg = Message::new("x");
        msg.analysis = Some(Analysis {
            word_count: 42,
            sentiment: Sentiment::Negative,
            ..Default::default()
        });
        msg.translations = Some(BTreeMap::from([
            ("spanish".to_string(), "hola".to_string()),
            ("french".to_string(), "salut".to_string()),
        ]));

        let out = Aggregator::new().aggregate(msg).unwrap();
        let stats = &out.metadata["statistics"];

        assert_eq!(stats["word_count"], 42);
        assert_eq!(stats["sentiment"], "negative");
        assert_eq!(stats["translation_count"], 2);
        assert_eq!(stats["formats_available"], json!([]));
    }
}
