//! Symptom extraction from free text.
//!
//! Two passes, unioned:
//! 1. Phrase overlap: each clause is compared token-wise against every
//!    lexicon expression, boosted by temporal/intensity/negation cues.
//! 2. Variants: any normalized token matching a synonym of a known symptom.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

use super::context::TriageContext;
use super::lexicon::symptom_key;
use super::normalizer::strip_punctuation;
use super::segmenter::segment;

/// Added per cue class present in the text.
pub const CONTEXT_CUE_WEIGHT: f32 = 0.2;
pub const MAX_CONTEXT_SCORE: f32 = 0.6;
/// Shared tokens required before a phrase is compared at all.
pub const MIN_COMMON_TOKENS: usize = 2;
/// Phrase confidence must exceed this to detect the symptom.
pub const PHRASE_MATCH_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextCue {
    Temporal,
    Intensity,
    Negation,
}

const CONTEXT_PATTERNS: &[(ContextCue, &[&str])] = &[
    (
        ContextCue::Temporal,
        &["always", "often", "lately", "recently", "days", "weeks"],
    ),
    (
        ContextCue::Intensity,
        &["very", "extremely", "so much", "really", "too"],
    ),
    (
        ContextCue::Negation,
        &["can't", "don't", "won't", "not", "never"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    PhraseOverlap,
    Variant,
}

/// Why a symptom was detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomMatch {
    pub symptom: String,
    pub source: DetectionSource,
    /// Phrase-overlap confidence clamped to [0, 1]; absent for variant hits.
    pub confidence: Option<f32>,
    /// The clause or token that triggered the match.
    pub evidence: String,
}

pub struct SymptomExtractor {
    context: Arc<TriageContext>,
    /// Cue patterns as surface-token sequences.
    cue_patterns: Vec<(ContextCue, Vec<Vec<String>>)>,
}

impl SymptomExtractor {
    pub fn new(context: Arc<TriageContext>) -> Self {
        let cue_patterns = CONTEXT_PATTERNS
            .iter()
            .map(|(cue, patterns)| {
                let sequences = patterns
                    .iter()
                    .map(|p| {
                        strip_punctuation(&p.to_lowercase())
                            .split_whitespace()
                            .map(str::to_string)
                            .collect()
                    })
                    .collect();
                (*cue, sequences)
            })
            .collect();
        Self {
            context,
            cue_patterns,
        }
    }

    /// Cue classes present in `text` and the resulting context score.
    pub fn context_score(&self, text: &str) -> (f32, Vec<ContextCue>) {
        let tokens = self.context.normalizer().surface_tokens(text);
        let cues: Vec<ContextCue> = self
            .cue_patterns
            .iter()
            .filter(|(_, sequences)| {
                sequences.iter().any(|seq| {
                    !seq.is_empty() && tokens.windows(seq.len()).any(|w| w == seq.as_slice())
                })
            })
            .map(|(cue, _)| *cue)
            .collect();
        let score = (cues.len() as f32 * CONTEXT_CUE_WEIGHT).min(MAX_CONTEXT_SCORE);
        (score, cues)
    }

    /// Detected symptom names. Empty input yields an empty set.
    pub fn extract<I, S>(&self, user_text: &str, known_symptoms: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extract_detailed(user_text, known_symptoms)
            .into_iter()
            .map(|m| m.symptom)
            .collect()
    }

    /// Like [`extract`](Self::extract), with the evidence for each symptom.
    pub fn extract_detailed<I, S>(&self, user_text: &str, known_symptoms: I) -> Vec<SymptomMatch>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if user_text.trim().is_empty() {
            return Vec::new();
        }
        let lexicon = self.context.lexicon();
        let normalizer = self.context.normalizer();

        // Keyed by canonical symptom key.
        let mut detected: BTreeMap<String, SymptomMatch> = BTreeMap::new();

        let (context_score, cues) = self.context_score(user_text);
        for phrase in segment(user_text) {
            let phrase_tokens: HashSet<String> =
                normalizer.normalize(&phrase).into_iter().collect();
            if phrase_tokens.len() < MIN_COMMON_TOKENS {
                continue;
            }
            for (index, symptom) in lexicon.symptoms().iter().enumerate() {
                for expression in self.context.expressions(index) {
                    let common = expression.token_set.intersection(&phrase_tokens).count();
                    if common < MIN_COMMON_TOKENS || expression.tokens.is_empty() {
                        continue;
                    }
                    let confidence = common as f32 / expression.tokens.len() as f32 + context_score;
                    if confidence <= PHRASE_MATCH_THRESHOLD {
                        continue;
                    }
                    let reported = confidence.clamp(0.0, 1.0);
                    let entry = detected
                        .entry(symptom.key.clone())
                        .or_insert_with(|| SymptomMatch {
                            symptom: symptom.name.clone(),
                            source: DetectionSource::PhraseOverlap,
                            confidence: Some(reported),
                            evidence: phrase.clone(),
                        });
                    if entry.confidence.is_some_and(|c| reported > c) {
                        entry.confidence = Some(reported);
                        entry.evidence = phrase.clone();
                    }
                }
            }
        }

        let words: HashSet<String> = normalizer.normalize(user_text).into_iter().collect();
        for name in known_symptoms {
            let name = name.as_ref();
            let key = symptom_key(name);
            if key.is_empty() || detected.contains_key(&key) {
                continue;
            }
            let variants = self.context.variants().expand(name);
            let hit = words.iter().filter(|w| variants.contains(*w)).min();
            if let Some(word) = hit {
                let display = lexicon
                    .symptom(name)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| name.to_string());
                detected.insert(
                    key,
                    SymptomMatch {
                        symptom: display,
                        source: DetectionSource::Variant,
                        confidence: None,
                        evidence: word.clone(),
                    },
                );
            }
        }

        debug!(
            count = detected.len(),
            context_score,
            cues = ?cues,
            "Symptom extraction complete"
        );

        let mut matches: Vec<SymptomMatch> = detected.into_values().collect();
        matches.sort_by(|a, b| a.symptom.cmp(&b.symptom));
        matches
    }
}
