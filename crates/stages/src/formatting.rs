//! Stage C4 - markdown/HTML formatting

use async_trait::async_trait;
use contracts::{stage_names, ContractError, Message, Stage};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::format::{format_html, format_markdown};

const TITLE_MAX_CHARS: usize = 50;
const MARKDOWN_VALIDATION_PASSES: usize = 3;
const HTML_OPTIMIZATION_ITERATIONS: usize = 5;

/// "Story: <prompt>", with prompts over 50 characters cut and suffixed "..."
pub fn story_title(user_input: &str) -> String {
    if user_input.chars().count() > TITLE_MAX_CHARS {
        let head: String = user_input.chars().take(TITLE_MAX_CHARS).collect();
        format!("Story: {head}...")
    } else {
        format!("Story: {user_input}")
    }
}

fn quality(document: &str) -> usize {
    (document.chars().count() * document.split_whitespace().count()) % 1000
}

fn formatting_metadata(story: &str, markdown: &str, html: &str) -> Value {
    let words = story.split_whitespace().count();
    let style = if 45 * words > 1000 { "detailed" } else { "standard" };

    json!({
        "formatting_style": style,
        "paragraph_count": story.split("\n\n").filter(|p| !p.trim().is_empty()).count(),
        "sentence_count": story.split(". ").filter(|s| !s.trim().is_empty()).count(),
        "markdown_validation_passes": MARKDOWN_VALIDATION_PASSES,
        "html_optimization_iterations": HTML_OPTIMIZATION_ITERATIONS,
        "quality_scores": {
            "markdown": quality(markdown),
            "html": quality(html),
        },
    })
}

/// Writes `formatted_output` (markdown, html, title) and `formatting_metadata`
#[derive(Debug, Clone, Copy, Default)]
pub struct FormattingStage;

impl FormattingStage {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, mut message: Message) -> Result<Message, ContractError> {
        let story = message.story_text.clone().unwrap_or_default();
        let title = story_title(&message.user_input);
        let markdown = format_markdown(&story, &title);
        let html = format_html(&story, &title);

        message.metadata.insert(
            "formatting_metadata".into(),
            formatting_metadata(&story, &markdown, &html),
        );
        message.formatted_output = Some(BTreeMap::from([
            ("markdown".to_string(), markdown),
            ("html".to_string(), html),
            ("title".to_string(), title),
        ]));
        Ok(message)
    }
}

#[async_trait]
impl Stage for FormattingStage {
    fn name(&self) -> &str {
        stage_names::FORMATTING
    }

    async fn process(&self, message: Message) -> Result<Message, ContractError> {
        self.format(message)
    }
}
