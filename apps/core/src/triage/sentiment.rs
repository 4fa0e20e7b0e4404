//! Rule-based polarity scoring (VADER-style).
//!
//! Valences come from the lexicon's sentiment table. Boosters, negation,
//! ALL-CAPS emphasis, a contrastive "but" and trailing `!`/`?` adjust them;
//! the summed valence is squashed into a compound score in [-1, 1].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::normalizer::demojize;
use crate::error::{AppError, AppResult};

/// Booster increment/decrement.
const B_INCR: f32 = 0.293;
const B_DECR: f32 = -0.293;
/// ALL-CAPS emphasis when the rest of the text is mixed case.
const C_INCR: f32 = 0.733;
/// Negation flips and dampens.
const N_SCALAR: f32 = -0.74;
/// Normalization constant in `x / sqrt(x² + ALPHA)`.
const ALPHA: f32 = 15.0;

const EXCLAMATION_BOOST: f32 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const QUESTION_BOOST: f32 = 0.18;
const MAX_QUESTION_BOOST: f32 = 0.96;

/// Compound score beyond which text counts as positive/negative.
pub const POLARITY_THRESHOLD: f32 = 0.05;

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "ain't", "aren't",
    "can't", "couldn't", "daren't", "didn't", "doesn't", "dont", "hadnt", "hasnt", "havent",
    "isnt", "mightnt", "mustnt", "neither", "don't", "hadn't", "hasn't", "haven't", "isn't",
    "mightn't", "mustn't", "neednt", "needn't", "never", "none", "nope", "nor", "not", "nothing",
    "nowhere", "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent", "oughtn't", "shan't",
    "shouldn't", "uh-uh", "wasn't", "weren't", "without", "wont", "wouldnt", "won't", "wouldn't",
    "rarely", "seldom", "despite",
];

const BOOSTERS_UP: &[&str] = &[
    "absolutely", "amazingly", "awfully", "completely", "considerably", "decidedly", "deeply",
    "enormously", "entirely", "especially", "exceptionally", "extremely", "fabulously", "fully",
    "greatly", "hella", "highly", "hugely", "incredibly", "intensely", "majorly", "more", "most",
    "particularly", "purely", "quite", "really", "remarkably", "so", "substantially",
    "thoroughly", "totally", "tremendously", "unbelievably", "unusually", "utterly", "very",
];

const BOOSTERS_DOWN: &[&str] = &[
    "almost", "barely", "hardly", "kinda", "kindof", "less", "little", "marginally",
    "occasionally", "partly", "scarcely", "slightly", "somewhat", "sorta", "sortof",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn from_compound(compound: f32) -> Self {
        if compound >= POLARITY_THRESHOLD {
            SentimentLabel::Positive
        } else if compound <= -POLARITY_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Raw polarity proportions plus the normalized compound score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolarityScores {
    pub neg: f32,
    pub neu: f32,
    pub pos: f32,
    pub compound: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    #[serde(rename = "sentiment")]
    pub label: SentimentLabel,
    /// `|compound|`
    pub intensity: f32,
    #[serde(rename = "scores")]
    pub raw_scores: PolarityScores,
}

impl SentimentResult {
    pub fn from_scores(raw_scores: PolarityScores) -> Self {
        Self {
            label: SentimentLabel::from_compound(raw_scores.compound),
            intensity: raw_scores.compound.abs(),
            raw_scores,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    valences: HashMap<String, f32>,
}

impl SentimentAnalyzer {
    pub fn new(valences: HashMap<String, f32>) -> Self {
        Self { valences }
    }

    /// Scores non-empty text. Blank input is an input error.
    pub fn score(&self, text: &str) -> AppResult<SentimentResult> {
        if text.trim().is_empty() {
            return Err(AppError::Input(
                "Input text must be a non-empty string".to_string(),
            ));
        }
        Ok(SentimentResult::from_scores(self.polarity_scores(text)))
    }

    /// `|compound|`, or 0 for blank text.
    pub fn intensity(&self, text: &str) -> f32 {
        self.polarity_scores(text).compound.abs()
    }

    pub fn polarity_scores(&self, text: &str) -> PolarityScores {
        let text = demojize(text);
        let words = split_words(&text);
        if words.is_empty() {
            return PolarityScores::default();
        }
        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let cap_diff = is_cap_diff(&words);

        let mut sentiments = Vec::with_capacity(words.len());
        for (i, word) in lowered.iter().enumerate() {
            let is_booster = BOOSTERS_UP.contains(&word.as_str())
                || BOOSTERS_DOWN.contains(&word.as_str());
            let kind_of = word == "kind" && lowered.get(i + 1).is_some_and(|n| n == "of");
            if is_booster || kind_of {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(self.valence_at(i, &words, &lowered, cap_diff));
        }

        but_shift(&lowered, &mut sentiments);
        score_valence(&sentiments, &text)
    }

    fn valence_at(&self, i: usize, words: &[&str], lowered: &[String], cap_diff: bool) -> f32 {
        let Some(&base) = self.valences.get(&lowered[i]) else {
            return 0.0;
        };
        let mut valence = base;

        if lowered[i] == "no"
            && lowered
                .get(i + 1)
                .is_some_and(|next| self.valences.contains_key(next))
        {
            valence = 0.0;
        }
        let preceded_by_no = (i > 0 && lowered[i - 1] == "no")
            || (i > 1 && lowered[i - 2] == "no")
            || (i > 2
                && lowered[i - 3] == "no"
                && matches!(lowered[i - 1].as_str(), "or" | "nor"));
        if preceded_by_no {
            valence = base * N_SCALAR;
        }

        if cap_diff && is_upper(words[i]) {
            valence += if valence > 0.0 { C_INCR } else { -C_INCR };
        }

        for distance in 0..3 {
            if i <= distance {
                break;
            }
            let prior = &lowered[i - (distance + 1)];
            if self.valences.contains_key(prior) {
                continue;
            }
            let mut scalar = booster_scalar(prior, words[i - (distance + 1)], valence, cap_diff);
            if distance == 1 {
                scalar *= 0.95;
            } else if distance == 2 {
                scalar *= 0.9;
            }
            valence += scalar;
            valence = negation_check(valence, lowered, distance, i);
        }
        valence
    }
}

/// Whitespace split; surrounding punctuation is stripped from words longer
/// than two characters, and single characters are dropped.
fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|token| {
            let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
            if stripped.chars().count() <= 2 {
                token
            } else {
                stripped
            }
        })
        .filter(|w| w.chars().count() > 1)
        .collect()
}

fn is_upper(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && !word.chars().any(char::is_lowercase)
}

fn is_cap_diff(words: &[&str]) -> bool {
    let upper = words.iter().filter(|w| is_upper(w)).count();
    upper > 0 && upper < words.len()
}

fn is_negated(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.contains("n't")
}

fn booster_scalar(lowered: &str, original: &str, valence: f32, cap_diff: bool) -> f32 {
    let mut scalar = if BOOSTERS_UP.contains(&lowered) {
        B_INCR
    } else if BOOSTERS_DOWN.contains(&lowered) {
        B_DECR
    } else {
        return 0.0;
    };
    if valence < 0.0 {
        scalar = -scalar;
    }
    if cap_diff && is_upper(original) {
        scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
    }
    scalar
}

fn negation_check(valence: f32, lowered: &[String], distance: usize, i: usize) -> f32 {
    let at = |offset: usize| lowered[i - offset].as_str();
    match distance {
        0 if is_negated(at(1)) => valence * N_SCALAR,
        1 => {
            if at(2) == "never" && matches!(at(1), "so" | "this") {
                valence * 1.25
            } else if at(2) == "without" && at(1) == "doubt" {
                valence
            } else if is_negated(at(2)) {
                valence * N_SCALAR
            } else {
                valence
            }
        }
        2 => {
            if at(3) == "never"
                && (matches!(at(2), "so" | "this") || matches!(at(1), "so" | "this"))
            {
                valence * 1.25
            } else if at(3) == "without" && (at(2) == "doubt" || at(1) == "doubt") {
                valence
            } else if is_negated(at(3)) {
                valence * N_SCALAR
            } else {
                valence
            }
        }
        _ => valence,
    }
}

/// Sentiment before "but" is halved, after it amplified by half.
fn but_shift(lowered: &[String], sentiments: &mut [f32]) {
    if let Some(pivot) = lowered.iter().position(|w| w == "but") {
        for (idx, s) in sentiments.iter_mut().enumerate() {
            if idx < pivot {
                *s *= 0.5;
            } else if idx > pivot {
                *s *= 1.5;
            }
        }
    }
}

fn punctuation_emphasis(text: &str) -> f32 {
    let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
    let questions = text.matches('?').count();
    let question_boost = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f32 * QUESTION_BOOST,
        _ => MAX_QUESTION_BOOST,
    };
    exclamations as f32 * EXCLAMATION_BOOST + question_boost
}

fn normalize(score: f32) -> f32 {
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn round_to(value: f32, places: i32) -> f32 {
    let factor = 10f32.powi(places);
    (value * factor).round() / factor
}

fn score_valence(sentiments: &[f32], text: &str) -> PolarityScores {
    let emphasis = punctuation_emphasis(text);
    let mut sum: f32 = sentiments.iter().sum();
    if sum > 0.0 {
        sum += emphasis;
    } else if sum < 0.0 {
        sum -= emphasis;
    }
    let compound = normalize(sum);

    let mut pos_sum = 0.0f32;
    let mut neg_sum = 0.0f32;
    let mut neu_count = 0.0f32;
    for &s in sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neu_count += 1.0;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += emphasis;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= emphasis;
    }

    let total = pos_sum + neg_sum.abs() + neu_count;
    if total == 0.0 {
        return PolarityScores::default();
    }
    PolarityScores {
        neg: round_to((neg_sum / total).abs(), 3),
        neu: round_to((neu_count / total).abs(), 3),
        pos: round_to((pos_sum / total).abs(), 3),
        compound: round_to(compound, 4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> SentimentAnalyzer {
        let valences = [
            ("sad", -2.1),
            ("happy", 2.7),
            ("good", 1.9),
            ("tired", -1.0),
            ("hopeless", -2.0),
            ("great", 3.1),
        ]
        .iter()
        .map(|(w, v)| (w.to_string(), *v))
        .collect();
        SentimentAnalyzer::new(valences)
    }

    #[test]
    fn test_basic_polarity() {
        let analyzer = analyzer();
        let label = |text: &str| analyzer.score(text).unwrap().label;
        assert_eq!(label("I am sad"), SentimentLabel::Negative);
        assert_eq!(label("I am happy"), SentimentLabel::Positive);
        assert_eq!(label("The table"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_single_word_compound_matches_formula() {
        let scores = analyzer().polarity_scores("sad");
        let expected = -2.1 / (2.1f32 * 2.1 + 15.0).sqrt();
        assert!((scores.compound - expected).abs() < 1e-3);
        assert!((scores.neg - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let analyzer = analyzer();
        let plain = analyzer.polarity_scores("I am happy").compound;
        let negated = analyzer.polarity_scores("I am not happy").compound;
        assert!(plain > 0.0);
        assert!(negated < 0.0);
    }

    #[test]
    fn test_boosters_and_caps_intensify() {
        let analyzer = analyzer();
        let plain = analyzer.polarity_scores("I am sad").compound;
        let boosted = analyzer.polarity_scores("I am very sad").compound;
        let shouted = analyzer.polarity_scores("I am SAD today").compound;
        assert!(boosted < plain);
        let lowercase = analyzer.polarity_scores("I am sad today").compound;
        assert!(shouted < lowercase);
    }

    #[test]
    fn test_exclamation_emphasis() {
        let analyzer = analyzer();
        let calm = analyzer.polarity_scores("this is great").compound;
        let excited = analyzer.polarity_scores("this is great!!!").compound;
        assert!(excited > calm);
    }

    #[test]
    fn test_but_shifts_weight_to_second_clause() {
        let analyzer = analyzer();
        let result = analyzer.polarity_scores("I was happy but now I am sad");
        assert!(result.compound < 0.0);
    }

    #[test]
    fn test_label_thresholds_and_intensity() {
        for text in ["sad", "happy", "good but tired", "nothing here", "not good"] {
            let result = analyzer().score(text).unwrap();
            let compound = result.raw_scores.compound;
            assert_eq!(result.label, SentimentLabel::from_compound(compound));
            assert!((result.intensity - compound.abs()).abs() < 1e-6);
        }
        let label = SentimentLabel::from_compound;
        assert_eq!(label(0.05), SentimentLabel::Positive);
        assert_eq!(label(-0.05), SentimentLabel::Negative);
        assert_eq!(label(0.049), SentimentLabel::Neutral);
    }

    #[test]
    fn test_blank_text_is_rejected() {
        assert!(matches!(analyzer().score("   "), Err(AppError::Input(_))));
        assert_eq!(analyzer().intensity(""), 0.0);
    }

    #[test]
    fn test_deterministic() {
        let analyzer = analyzer();
        let text = "I'm SO tired and hopeless, nothing is good!!";
        assert_eq!(
            analyzer.polarity_scores(text),
            analyzer.polarity_scores(text)
        );
    }

    #[test]
    fn test_serializes_like_api_payload() {
        let result = analyzer().score("sad").unwrap();
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["sentiment"], "negative");
        assert!(json["scores"]["compound"].as_f64().unwrap() < 0.0);
    }
}
