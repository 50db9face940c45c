//! Stage C3 - phrase-table translation

use async_trait::async_trait;
use contracts::{stage_names, ContractError, Message, Stage};
use serde_json::json;
use std::collections::BTreeMap;

use crate::text::round_to;

const REFINEMENT_PASSES: usize = 3;
const STRIP_CHARS: &[char] = &['.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\''];

/// English phrase -> replacement, applied in order
type PhraseTable = &'static [(&'static str, &'static str)];

const SPANISH: PhraseTable = &[
    ("Once upon a time", "Había una vez"),
    ("in a world where", "en un mundo donde"),
    ("they discovered", "descubrieron"),
    ("journeyed to", "viajaron a"),
    ("encountered", "encontraron"),
    ("And so", "Y así"),
    ("forever", "para siempre"),
    ("adventure", "aventura"),
    ("discovery", "descubrimiento"),
    ("space", "espacio"),
    ("robot", "robot"),
    ("story", "historia"),
];

const FRENCH: PhraseTable = &[
    ("Once upon a time", "Il était une fois"),
    ("in a world where", "dans un monde où"),
    ("they discovered", "ils ont découvert"),
    ("journeyed to", "voyagé vers"),
    ("encountered", "rencontré"),
    ("And so", "Et ainsi"),
    ("forever", "pour toujours"),
    ("adventure", "aventure"),
    ("discovery", "découverte"),
    ("space", "espace"),
    ("robot", "robot"),
    ("story", "histoire"),
];

/// Target languages in output order
pub const LANGUAGES: [(&str, PhraseTable); 2] = [("spanish", SPANISH), ("french", FRENCH)];

#[derive(Debug, Clone, PartialEq)]
struct Translated {
    text: String,
    replacement_count: usize,
    untranslated_words: usize,
    quality_score: f64,
}

fn translate(story: &str, table: PhraseTable) -> Translated {
    let mut text = story.to_string();
    let mut replacement_count = 0;
    for (phrase, replacement) in table {
        if text.contains(phrase) {
            text = text.replace(phrase, replacement);
            replacement_count += 1;
        }
    }

    let lowered_keys: Vec<String> = table.iter().map(|(k, _)| k.to_lowercase()).collect();
    let untranslated_words = story
        .split_whitespace()
        .filter(|word| !table.iter().any(|(k, _)| k == word))
        .filter(|word| {
            let clean = word.to_lowercase();
            let clean = clean.trim_matches(STRIP_CHARS);
            !lowered_keys.iter().any(|k| k == clean)
        })
        .count();

    let quality: u32 = text
        .split_whitespace()
        .map(|word| word.to_lowercase().chars().map(|c| c as u32 % 10).sum::<u32>())
        .sum();

    Translated {
        text,
        replacement_count,
        untranslated_words,
        quality_score: round_to(f64::from(quality), 2),
    }
}

/// Writes `translations` and per-language metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslationStage;

impl TranslationStage {
    pub fn new() -> Self {
        Self
    }

    pub fn translate(&self, mut message: Message) -> Result<Message, ContractError> {
        let story = message.story_text.clone().unwrap_or_default();
        let mut translations = BTreeMap::new();

        for (lang, table) in LANGUAGES {
            let result = translate(&story, table);
            message.metadata.insert(
                format!("{lang}_translation_metadata"),
                json!({
                    "replacement_count": result.replacement_count,
                    "untranslated_words": result.untranslated_words,
                    "quality_score": result.quality_score,
                    "refinement_passes": REFINEMENT_PASSES,
                }),
            );
            translations.insert(lang.to_string(), result.text);
        }

        message.translations = Some(translations);
        Ok(message)
    }
}

#[async_trait]
impl Stage for TranslationStage {
    fn name(&self) -> &str {
        stage_names::TRANSLATION
    }

    async fn process(&self, message: Message) -> Result<Message, ContractError> {
        self.translate(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_replacement() {
        let out = translate("Once upon a time a robot found space.", SPANISH);
        assert_eq!(out.text, "Había una vez a robot found espacio.");
        assert_eq!(out.replacement_count, 3);
    }

    #[test]
    fn test_untranslated_words() {
        // "robot" and "space." are table keys once cleaned
        let out = translate("the robot saw space.", FRENCH);
        assert_eq!(out.untranslated_words, 2);
    }

    #[test]
    fn test_quality_score() {
        // 'a' = 97 -> 7, 'b' = 98 -> 8
        let out = translate("ab a", SPANISH);
        assert_eq!(out.quality_score, 22.0);
    }

    #[test]
    fn test_stage_output() {
        let mut msg = Message::new("x");
        msg.story_text = Some("And so the story ended forever.".into());

        let out = TranslationStage::new().translate(msg).unwrap();
        let translations = out.translations.unwrap();

        assert_eq!(translations["spanish"], "Y así the historia ended para siempre.");
        assert_eq!(translations["french"], "Et ainsi the histoire ended pour toujours.");
        assert_eq!(out.metadata["spanish_translation_metadata"]["replacement_count"], 3);
        assert_eq!(out.metadata["french_translation_metadata"]["refinement_passes"], 3);
    }

    #[test]
    fn test_empty_story() {
        let out = TranslationStage::new().translate(Message::new("x")).unwrap();
        assert_eq!(out.translations.unwrap()["spanish"], "");
    }
}
