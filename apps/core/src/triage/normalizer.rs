//! Text normalization: emoji names, lowercase, punctuation, stopwords, spelling.
//!
//! `normalize` is the full pipeline used for matching. `surface_tokens` stops
//! before stopword removal so cue words ("very", "not", "too") stay visible.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use unicode_segmentation::UnicodeSegmentation;

/// Connectives kept even though they are stopwords; the segmenter splits on them.
pub const PROTECTED_CONNECTIVES: &[&str] =
    &["and", "but", "also", "then", "so", "because", "or", "even"];

/// Non-ASCII punctuation stripped alongside ASCII punctuation.
const EXTRA_PUNCTUATION: &[char] = &['’', '‘', '“', '”', '…', '–', '—', '«', '»', '¿', '¡'];

/// Minimum similarity (1 - distance / longest) for a spelling correction.
pub const MIN_CORRECTION_SIMILARITY: f32 = 0.8;

/// Tokens shorter than this are never corrected.
const MIN_CORRECTABLE_LEN: usize = 4;

/// Replaces each emoji grapheme with its spaced, lowercase name.
///
/// "so tired 😴" becomes "so tired  sleeping face ".
pub fn demojize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for grapheme in text.graphemes(true) {
        let emoji = if grapheme.is_ascii() {
            None
        } else {
            emojis::get(grapheme).or_else(|| emojis::get(grapheme.trim_end_matches('\u{fe0f}')))
        };
        match emoji {
            Some(emoji) => {
                let name = emoji.name().to_lowercase();
                out.push(' ');
                out.push_str(&name.replace(['_', ':'], " "));
                out.push(' ');
            }
            None => out.push_str(grapheme),
        }
    }
    out
}

pub fn strip_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| !(c.is_ascii_punctuation() || EXTRA_PUNCTUATION.contains(c)))
        .collect()
}

/// Edit distance over chars, two-row formulation.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Dictionary-based corrector: unknown words snap to the closest known word.
///
/// The dictionary must cover ordinary English, not only the lexicon: a real
/// word missing from it gets pulled toward the nearest lexicon word.
#[derive(Debug, Clone)]
pub struct SpellChecker {
    /// Words grouped by char count, each group sorted so ties resolve to the
    /// alphabetically first candidate.
    by_len: BTreeMap<usize, Vec<String>>,
    known: HashSet<String>,
    min_similarity: f32,
}

impl SpellChecker {
    pub fn new(words: BTreeSet<String>) -> Self {
        let known = words.iter().cloned().collect();
        let mut by_len: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for word in words {
            by_len.entry(word.chars().count()).or_default().push(word);
        }
        Self {
            by_len,
            known,
            min_similarity: MIN_CORRECTION_SIMILARITY,
        }
    }

    pub fn is_known(&self, word: &str) -> bool {
        self.known.contains(word)
    }

    /// Returns the correction for `word`, or `word` itself when none is close enough.
    pub fn correct(&self, word: &str) -> String {
        let len = word.chars().count();
        if len < MIN_CORRECTABLE_LEN
            || self.is_known(word)
            || word.chars().any(char::is_numeric)
        {
            return word.to_string();
        }

        let mut best: Option<(&str, f32)> = None;
        for (candidate_len, candidates) in self.by_len.range(len.saturating_sub(2)..=len + 2) {
            let longest = (*candidate_len).max(len) as f32;
            for candidate in candidates {
                let similarity = 1.0 - levenshtein(word, candidate) as f32 / longest;
                if similarity < self.min_similarity {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((current, score)) => {
                        similarity > score
                            || (similarity == score && candidate.as_str() < current)
                    }
                };
                if better {
                    best = Some((candidate.as_str(), similarity));
                }
            }
        }

        best.map(|(w, _)| w.to_string())
            .unwrap_or_else(|| word.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stopwords: HashSet<String>,
    speller: SpellChecker,
}

impl TextNormalizer {
    /// `stopwords` minus the protected connectives become the removal set.
    pub fn new(stopwords: &HashSet<String>, speller: SpellChecker) -> Self {
        let stopwords = stopwords
            .iter()
            .filter(|w| !PROTECTED_CONNECTIVES.contains(&w.as_str()))
            .cloned()
            .collect();
        Self { stopwords, speller }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Emoji names, lowercase, punctuation stripped, split on whitespace.
    pub fn surface_tokens(&self, text: &str) -> Vec<String> {
        strip_punctuation(&demojize(text).to_lowercase())
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Full normalization: surface tokens without stopwords, spelling-corrected.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        self.surface_tokens(text)
            .into_iter()
            .filter(|token| !self.is_stopword(token))
            .map(|token| self.speller.correct(&token))
            .collect()
    }
}
