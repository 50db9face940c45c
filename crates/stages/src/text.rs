//! Text statistics shared by the content stages

use contracts::Sentiment;
use std::collections::HashMap;

const POSITIVE_WORDS: &[&str] = &[
    "happy", "joy", "success", "love", "beautiful", "wonderful", "amazing", "fantastic",
    "brilliant", "delighted", "pleased", "excellent", "great", "good", "peaceful", "harmony",
    "cooperation", "friendship", "triumph", "victory", "discovery", "hope", "bright",
    "inspiring", "heroic",
];

const NEGATIVE_WORDS: &[&str] = &[
    "sad", "fear", "danger", "evil", "dark", "terrible", "awful", "horrible", "difficult",
    "struggle", "conflict", "failure", "lost", "defeat", "crisis", "threat", "worried",
    "anxious", "trouble",
];

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "be", "been", "being", "have", "has", "had", "do",
    "does", "did", "will", "would", "could", "should", "may", "might", "must", "can",
];

const NOT_NAMES: &[&str] = &["The", "A", "An", "This", "That", "There"];

/// Punctuation trimmed from word edges
pub(crate) const EDGE_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Non-empty runs between `.`, `!` and `?`
pub fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Non-empty blocks separated by a blank line
pub fn count_paragraphs(text: &str) -> usize {
    text.split("\n\n").filter(|p| !p.trim().is_empty()).count()
}

/// Positive/negative wins only when it outnumbers the other side 1.5 to 1
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let (mut positive, mut negative) = (0usize, 0usize);
    for word in lower.split_whitespace() {
        if POSITIVE_WORDS.contains(&word) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&word) {
            negative += 1;
        }
    }

    let (positive, negative) = (positive as f64, negative as f64);
    if positive > negative * 1.5 {
        Sentiment::Positive
    } else if negative > positive * 1.5 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Count occurrences, keeping first-seen order for ties
fn ranked<'a>(words: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for word in words {
        match index.get(word) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(word, order.len());
                order.push((word, 1));
            }
        }
    }
    order
}

/// Most frequent words longer than three characters, stop words excluded
pub fn extract_keywords(text: &str, top_n: usize) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();

    let mut counts = ranked(
        cleaned
            .split_whitespace()
            .filter(|w| !STOP_WORDS.contains(w) && w.chars().count() > 3),
    );
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(top_n)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Known names found in the text, or repeated capitalized words when no
/// names are known
pub fn extract_characters(text: &str, known: &[String]) -> Vec<String> {
    if !known.is_empty() {
        let lower = text.to_lowercase();
        return known
            .iter()
            .filter(|name| lower.contains(&name.to_lowercase()))
            .cloned()
            .collect();
    }

    let capitalized = text
        .split_whitespace()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .map(|w| w.trim_matches(EDGE_PUNCTUATION));

    ranked(capitalized)
        .into_iter()
        .filter(|(word, count)| *count > 1 && !NOT_NAMES.contains(word))
        .take(5)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Mean length of words without edge punctuation, two decimals
pub fn avg_word_length(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let total: usize = words
        .iter()
        .map(|w| w.trim_matches(EDGE_PUNCTUATION).chars().count())
        .sum();
    round_to(total as f64 / words.len() as f64, 2)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
