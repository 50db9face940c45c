//! Console summary of a finished run.

use contracts::Message;
use std::fmt::Write;

/// Characters of story shown in the summary
const PREVIEW_CHARS: usize = 300;
const KEYWORDS_SHOWN: usize = 5;

/// Print the results summary to stdout
pub fn print_results(message: &Message) {
    print!("{}", render_results(message));
}

/// Summary of every populated output field
pub fn render_results(message: &Message) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);
    let _ = writeln!(out, "\n{rule}\nResults Summary\n{rule}");

    if let Some(story) = &message.story_text {
        let _ = writeln!(
            out,
            "\n📖 Generated Story ({} words):\n{}",
            message.story_word_count(),
            "-".repeat(60)
        );
        let _ = writeln!(out, "{}", preview(story));
    }

    if let Some(analysis) = &message.analysis {
        let keywords: Vec<&str> = analysis
            .keywords
            .iter()
            .take(KEYWORDS_SHOWN)
            .map(String::as_str)
            .collect();
        let _ = writeln!(out, "\n📊 Analysis:");
        let _ = writeln!(out, "  - Sentiment: {}", analysis.sentiment);
        let _ = writeln!(out, "  - Keywords: {}", keywords.join(", "));
        if !analysis.characters.is_empty() {
            let _ = writeln!(out, "  - Characters: {}", analysis.characters.join(", "));
        }
    }

    if let Some(concept) = &message.image_concept {
        let _ = writeln!(out, "\n🎨 Image Concept:");
        let _ = writeln!(out, "  - Scene: {}", concept.scene_description);
        let _ = writeln!(out, "  - Mood: {}", concept.mood);
        let _ = writeln!(out, "  - Colors: {}", concept.color_palette.join(", "));
    }

    if let Some(script) = &message.audio_script {
        let _ = writeln!(out, "\n🎙️ Audio Script:");
        let _ = writeln!(
            out,
            "  - Estimated Duration: {} minutes",
            script.duration_estimate_minutes
        );
        let _ = writeln!(out, "  - Tone: {}", script.tone);
    }

    if let Some(translations) = &message.translations {
        let _ = writeln!(out, "\n🌐 Translations Available:");
        for lang in translations.keys() {
            let _ = writeln!(out, "  - {}", capitalize(lang));
        }
    }

    if let Some(formats) = &message.formatted_output {
        let _ = writeln!(out, "\n📄 Formatted Outputs Available:");
        for format in formats.keys() {
            let _ = writeln!(out, "  - {}", format.to_uppercase());
        }
    }

    out
}

fn preview(story: &str) -> String {
    let mut chars = story.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
