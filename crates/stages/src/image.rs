//! Stage C1 - image concept

use async_trait::async_trait;
use contracts::{stage_names, ContractError, ImageConcept, Message, Sentiment, Stage};
use rand::seq::IndexedRandom;
use serde_json::{json, Map, Value};

const COLOR_ANALYSIS_ITERATIONS: u32 = 15;
const PALETTE_SIZE: usize = 3;
const STYLES: &[&str] = &[
    "digital art",
    "fantasy illustration",
    "realistic painting",
    "abstract design",
];

fn palette(sentiment: Sentiment) -> &'static [&'static str] {
    match sentiment {
        Sentiment::Positive => &[
            "bright blue",
            "golden yellow",
            "emerald green",
            "sky blue",
            "sunset orange",
        ],
        Sentiment::Negative => &[
            "deep purple",
            "dark gray",
            "crimson red",
            "midnight blue",
            "storm gray",
        ],
        Sentiment::Neutral => &["silver", "steel blue", "charcoal", "ocean blue", "mist gray"],
    }
}

fn scenes(theme: &str) -> &'static [&'static str] {
    match theme {
        "space" => &[
            "futuristic space station",
            "distant planet surface",
            "cosmic nebula",
            "asteroid field",
        ],
        "modern" => &["urban cityscape", "coastal town", "mountain vista", "tech hub"],
        "robots" => &[
            "futuristic factory",
            "smart city",
            "research laboratory",
            "cyber space",
        ],
        _ => &[
            "enchanted forest",
            "mystical castle",
            "magical realm",
            "ancient ruins",
        ],
    }
}

fn mood(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "hopeful adventure",
        Sentiment::Negative => "mysterious journey",
        Sentiment::Neutral => "contemplative exploration",
    }
}

/// Earliest item with the highest score
fn first_max<'a>(items: &[&'a str], score: impl Fn(&str) -> u32) -> Option<&'a str> {
    let mut best: Option<(&'a str, u32)> = None;
    for &item in items {
        let s = score(item);
        match best {
            Some((_, top)) if s <= top => {}
            _ => best = Some((item, s)),
        }
    }
    best.map(|(item, _)| item)
}

/// Top colors of the palette by a character-code score
fn select_colors(sentiment: Sentiment) -> Vec<String> {
    let mut scored: Vec<(&str, u32)> = palette(sentiment)
        .iter()
        .map(|color| {
            let score = color.bytes().map(u32::from).sum::<u32>() % 100;
            (*color, score * COLOR_ANALYSIS_ITERATIONS)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(PALETTE_SIZE)
        .map(|(color, _)| color.to_string())
        .collect()
}

fn select_style() -> &'static str {
    first_max(STYLES, |style| style.chars().map(|c| c as u32 % 50).sum()).unwrap_or(STYLES[0])
}

fn select_scene(theme: &str, keywords: &[String]) -> String {
    let candidates = scenes(theme);
    let matched = first_max(candidates, |scene| {
        let scene = scene.to_lowercase();
        keywords
            .iter()
            .filter(|k| scene.contains(&k.to_lowercase()))
            .count() as u32
            * 10
    })
    .filter(|scene| {
        keywords
            .iter()
            .any(|k| scene.to_lowercase().contains(&k.to_lowercase()))
    });

    matched
        .or_else(|| candidates.choose(&mut rand::rng()).copied())
        .unwrap_or(candidates[0])
        .to_string()
}

/// Writes `image_concept`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageConceptStage;

impl ImageConceptStage {
    pub fn new() -> Self {
        Self
    }

    pub fn conceive(&self, mut message: Message) -> Result<Message, ContractError> {
        let story = message.story_text.as_deref().unwrap_or_default();
        let theme = message
            .metadata
            .get("theme")
            .and_then(Value::as_str)
            .unwrap_or("fantasy");
        let (sentiment, keywords) = message
            .analysis
            .as_ref()
            .map(|a| (a.sentiment, a.keywords.clone()))
            .unwrap_or_default();

        let key_elements = if keywords.is_empty() {
            vec!["adventure".to_string(), "discovery".to_string()]
        } else {
            keywords.iter().take(3).cloned().collect()
        };

        let visual_elements = story
            .split_whitespace()
            .filter(|w| w.chars().count() > 4)
            .count();

        let mut extra = Map::new();
        extra.insert("visual_elements_detected".into(), json!(visual_elements));
        extra.insert(
            "color_analysis_iterations".into(),
            json!(COLOR_ANALYSIS_ITERATIONS),
        );

        let concept = ImageConcept {
            scene_description: select_scene(theme, &keywords),
            color_palette: select_colors(sentiment),
            mood: mood(sentiment).to_string(),
            key_elements,
            style: select_style().to_string(),
            extra,
        };

        message.image_concept = Some(concept);
        Ok(message)
    }
}

#[async_trait]
impl Stage for ImageConceptStage {
    fn name(&self) -> &str {
        stage_names::IMAGE_CONCEPT
    }

    async fn process(&self, message: Message) -> Result<Message, ContractError> {
        self.conceive(message)
    }
}
