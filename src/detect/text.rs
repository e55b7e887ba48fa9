//! Shared label-text cleaning and scoring helpers.
//!
//! Every detection strategy funnels candidate text through the same
//! cleaner and the same genericness/length adjustments so that scores
//! stay comparable across strategies.

use regex::Regex;
use std::sync::LazyLock;

/// Placeholder texts that carry no labeling value on their own.
static GENERIC_PLACEHOLDERS: &[&str] = &[
    "enter text",
    "search",
    "...",
    "..",
    "text",
    "input",
    "value",
    "type here",
    "click here",
    "placeholder",
    "select",
    "choose",
    "write here",
];

/// Single terms that describe a control rather than naming it.
static GENERIC_TERMS: &[&str] = &[
    "field", "input", "text", "value", "item", "option", "label", "button", "name", "data",
    "info", "untitled",
];

static INSTRUCTIONAL_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:please\s+)?(?:enter|type|input|write|fill(?:\s+in)?|add|search(?:\s+for)?|find|select|choose)\b",
    )
    .unwrap()
});

static INSTRUCTIONAL_EXTRACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:please\s+)?(?:enter|type|input|write|fill(?:\s+in)?|add|search(?:\s+for)?|find|select|choose)\s+(?:(?:your|a|an|the)\s+)?(.+)$",
    )
    .unwrap()
});

static EXAMPLE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:e\.g\.|ex\.|example:)").unwrap());

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static PHONE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s().-]{7,}$").unwrap());

static URL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:https?://|www\.)\S+$").unwrap());

/// Normalize candidate label text: trim, strip trailing ":" / "*",
/// collapse whitespace runs.
pub fn clean_label(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c: char| c == ':' || c == '*' || c.is_whitespace())
        .trim()
        .to_string()
}

/// Shared genericness check: text that describes "a control" instead of
/// naming one.
pub fn is_generic_label(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    lower.len() <= 1 || GENERIC_TERMS.contains(&lower.as_str())
}

/// Known throwaway placeholder texts ("enter text", "search", "...").
pub fn is_generic_placeholder(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    GENERIC_PLACEHOLDERS.contains(&lower.as_str())
}

/// Instructional phrasing: "Enter ...", "Type ...", trailing "here"/"..".
pub fn is_instructional(text: &str) -> bool {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    INSTRUCTIONAL_START.is_match(trimmed)
        || lower.ends_with("here")
        || trimmed.ends_with("..")
}

/// Recover the underlying concept from instructional text:
/// "Enter your email" -> "email", "Search for products here" -> "products".
pub fn extract_instructional_concept(text: &str) -> Option<String> {
    let caps = INSTRUCTIONAL_EXTRACT.captures(text.trim())?;
    let mut words: Vec<&str> = caps[1].split_whitespace().collect();
    if words
        .last()
        .map(|w| w.eq_ignore_ascii_case("here"))
        .unwrap_or(false)
    {
        words.pop();
    }
    let concept = words.join(" ").trim_end_matches('.').trim().to_string();

    if concept.len() >= 2 && !is_generic_label(&concept) {
        Some(concept)
    } else {
        None
    }
}

/// Example-style text: "e.g. jane@corp.com", bare email/phone/URL shapes.
pub fn looks_like_example(text: &str) -> bool {
    let trimmed = text.trim();
    EXAMPLE_PREFIX.is_match(trimmed)
        || EMAIL_SHAPE.is_match(trimmed)
        || URL_SHAPE.is_match(trimmed)
        || (PHONE_SHAPE.is_match(trimmed) && trimmed.chars().filter(|c| c.is_ascii_digit()).count() >= 7)
}

/// Length-based confidence adjustment: ideal 3..=30, penalize <3 or >50.
pub fn length_adjustment(text: &str) -> f32 {
    match text.chars().count() {
        3..=30 => 0.02,
        0..=2 => -0.10,
        n if n > 50 => -0.10,
        _ => 0.0,
    }
}

/// Clamp a confidence into [floor, 1.0].
pub fn clamp_confidence(value: f32, floor: f32) -> f32 {
    value.clamp(floor, 1.0)
}
