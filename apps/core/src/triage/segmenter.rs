//! Clause segmentation on connectives and punctuation.

use regex::Regex;
use std::sync::LazyLock;

/// Whole emoji sequences (ZWJ joins, skin tones, flags), words or
/// contractions, or any single non-space punctuation mark.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\p{Extended_Pictographic}",
        r"(?:\p{Emoji_Modifier}|\x{FE0F}|\x{200D}\p{Extended_Pictographic})*",
        r"|\p{Regional_Indicator}{2}",
        r"|\w+(?:['’]\w+)*",
        r"|[^\w\s]",
    ))
    .expect("token pattern is valid")
});

/// Tokens that close the current phrase (the trigger stays in that phrase).
pub const SPLIT_TRIGGERS: &[&str] = &[
    "and", "but", "also", "then", "so", "because", "or", "even", ",", "?", "!", ".",
];

pub fn tokenize(text: &str) -> Vec<&str> {
    TOKEN_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

fn is_trigger(token: &str) -> bool {
    SPLIT_TRIGGERS
        .iter()
        .any(|trigger| trigger.eq_ignore_ascii_case(token))
}

/// Splits `text` into clause-like phrases.
///
/// "I feel sad and tired" → ["I feel sad and", "tired"].
pub fn segment(text: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();

    for token in tokenize(text) {
        buffer.push(token);
        if is_trigger(token) {
            phrases.push(buffer.join(" "));
            buffer.clear();
        }
    }
    if !buffer.is_empty() {
        phrases.push(buffer.join(" "));
    }
    phrases
}
