//! Template story generation

use rand::seq::IndexedRandom;
use rand::Rng;

const OPENINGS: &[&str] = &[
    "Once upon a time",
    "In a world where",
    "Deep in the heart of",
    "Long ago, in the realm of",
    "At the edge of the universe",
    "In a distant galaxy",
    "Many years ago",
    "In a land far, far away",
];

const MIDDLE_EVENTS: &[&str] = &[
    "Along the way, they encountered challenges that tested their resolve.",
    "However, a mysterious obstacle appeared that changed everything.",
    "But their journey was not without unexpected surprises.",
    "Yet, what they found was far more remarkable than expected.",
    "Suddenly, they realized the true nature of their quest.",
];

const CONFLICTS: &[&str] = &[
    "They had to overcome their fears and work together.",
    "Time was running out, and decisions had to be made quickly.",
    "The stakes were higher than anyone had imagined.",
    "Old rivalries resurfaced, threatening to derail their mission.",
    "Nature itself seemed to conspire against their plans.",
];

const RESOLUTIONS: &[&str] = &[
    "In the end, they discovered that cooperation and understanding were the keys to success.",
    "Through perseverance and creativity, they found a way forward.",
    "The journey taught them valuable lessons about trust and friendship.",
    "With determination and teamwork, they achieved their goal.",
    "The experience transformed them in ways they never expected.",
];

const ENDINGS: &[&str] = &[
    "And so, their adventure became legend, inspiring future generations.",
    "The memory of this journey would stay with them forever.",
    "As the sun set, they knew they had found something precious.",
    "In that moment, everything fell into place.",
    "The story continues, but this chapter had come to a beautiful close.",
];

/// Word pools for one theme
pub struct Theme {
    pub name: &'static str,
    settings: &'static [&'static str],
    characters: &'static [&'static str],
    actions: &'static [&'static str],
    discoveries: &'static [&'static str],
}

/// Themes in match priority order
pub const THEMES: &[Theme] = &[
    Theme {
        name: "space",
        settings: &["space station", "distant planet", "asteroid field", "nebula", "alien world"],
        characters: &["astronaut", "alien", "robot", "space explorer", "cosmic engineer"],
        actions: &["discovered", "encountered", "explored", "journeyed to", "investigated"],
        discoveries: &[
            "ancient artifact",
            "mysterious signal",
            "new life form",
            "lost civilization",
            "cosmic secret",
        ],
    },
    Theme {
        name: "fantasy",
        settings: &[
            "enchanted forest",
            "ancient castle",
            "magical kingdom",
            "mystical realm",
            "hidden valley",
        ],
        characters: &["wizard", "dragon", "knight", "elf", "magical creature"],
        actions: &["fought", "discovered", "sought", "encountered", "saved"],
        discoveries: &[
            "ancient magic",
            "hidden treasure",
            "forgotten prophecy",
            "secret power",
            "legendary artifact",
        ],
    },
    Theme {
        name: "modern",
        settings: &["busy city", "quiet laboratory", "coastal town", "mountain retreat", "tech hub"],
        characters: &["scientist", "detective", "entrepreneur", "artist", "researcher"],
        actions: &["developed", "investigated", "created", "solved", "discovered"],
        discoveries: &[
            "breakthrough technology",
            "hidden truth",
            "creative solution",
            "ancient secret",
            "new perspective",
        ],
    },
    Theme {
        name: "robots",
        settings: &["factory", "research lab", "space station", "smart city", "cyber world"],
        characters: &["AI assistant", "robot companion", "cyborg", "engineer", "researcher"],
        actions: &[
            "programmed",
            "designed",
            "collaborated with",
            "learned from",
            "worked alongside",
        ],
        discoveries: &[
            "new capability",
            "emotional intelligence",
            "creative solution",
            "friendship",
            "understanding",
        ],
    },
];

/// Story length in paragraphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl StoryLength {
    fn paragraphs(&self) -> usize {
        match self {
            Self::Short => 2,
            Self::Medium => 3,
            Self::Long => 5,
        }
    }
}

/// Generated story with its derived metadata
#[derive(Debug, Clone)]
pub struct GeneratedStory {
    pub text: String,
    pub theme: &'static str,
    pub characters: Vec<String>,
}

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: &[&'static str]) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}

/// First theme named in the prompt, otherwise a random one
pub fn extract_theme<R: Rng + ?Sized>(prompt: &str, rng: &mut R) -> &'static Theme {
    let lower = prompt.to_lowercase();
    THEMES
        .iter()
        .find(|theme| lower.contains(theme.name))
        .or_else(|| THEMES.choose(rng))
        .unwrap_or(&THEMES[0])
}

/// Build a story from the theme's word pools
pub fn generate_story<R: Rng + ?Sized>(theme: &Theme, length: StoryLength, rng: &mut R) -> String {
    let count = length.paragraphs();
    let mut paragraphs = Vec::with_capacity(count);

    let action = pick(rng, theme.actions);
    paragraphs.push(format!(
        "{}, there was a {} who {} {}. During their quest, they {} a {} that would change everything.",
        pick(rng, OPENINGS),
        pick(rng, theme.characters),
        action,
        pick(rng, theme.settings),
        action,
        pick(rng, theme.discoveries),
    ));

    if count >= 3 {
        paragraphs.push(format!(
            "{} {}",
            pick(rng, MIDDLE_EVENTS),
            pick(rng, CONFLICTS)
        ));
    }
    if count >= 4 {
        paragraphs.push(pick(rng, RESOLUTIONS).to_string());
    }

    paragraphs.push(pick(rng, ENDINGS).to_string());
    paragraphs.join("\n\n")
}

/// Two character names suggested by the prompt
pub fn character_names(prompt: &str) -> Vec<String> {
    let lower = prompt.to_lowercase();
    let names: [&str; 3] = if lower.contains("robot") || lower.contains("ai") {
        ["Rover", "Aria", "Cortex"]
    } else if lower.contains("space") {
        ["Commander Nova", "Stellar", "Cosmic"]
    } else if lower.contains("fantasy") {
        ["Luna", "Thorn", "Ember"]
    } else {
        ["Alex", "Morgan", "Casey"]
    };
    names.iter().take(2).map(|n| n.to_string()).collect()
}

/// Theme, text and character names for a prompt
pub fn generate_with_characters<R: Rng + ?Sized>(prompt: &str, rng: &mut R) -> GeneratedStory {
    let theme = extract_theme(prompt, rng);
    GeneratedStory {
        text: generate_story(theme, StoryLength::default(), rng),
        theme: theme.name,
        characters: character_names(prompt),
    }
}
