//! Multi-signal confidence that a message matches a symptom expression.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::context::TriageContext;
use super::semantic::cosine_similarity;
use crate::error::{AppError, AppResult};

pub const SEMANTIC_WEIGHT: f32 = 0.5;
pub const FUZZY_WEIGHT: f32 = 0.3;
pub const SENTIMENT_WEIGHT: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    #[serde(rename = "overall_confidence")]
    pub overall: f32,
    /// Cosine similarity of the two embeddings; can be negative.
    pub semantic_similarity: f32,
    /// In [0, 1].
    pub fuzzy_match: f32,
    pub sentiment_intensity: f32,
}

impl ConfidenceScore {
    pub fn from_components(semantic: f32, fuzzy: f32, intensity: f32) -> Self {
        Self {
            overall: SEMANTIC_WEIGHT * semantic
                + FUZZY_WEIGHT * fuzzy
                + SENTIMENT_WEIGHT * intensity,
            semantic_similarity: semantic,
            fuzzy_match: fuzzy,
            sentiment_intensity: intensity,
        }
    }
}

/// Similarity ratio of two strings in [0, 1]: `2 * LCS / (len_a + len_b)`.
///
/// LCS is the longest common subsequence over chars, so the ratio equals
/// one minus the normalized insert/delete distance.
pub fn fuzzy_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return if a.is_empty() && b.is_empty() { 1.0 } else { 0.0 };
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs = prev[b.len()];
    (2 * lcs) as f32 / (a.len() + b.len()) as f32
}

pub struct ConfidenceScorer {
    context: Arc<TriageContext>,
}

impl ConfidenceScorer {
    pub fn new(context: Arc<TriageContext>) -> Self {
        Self { context }
    }

    pub fn score(&self, user_text: &str, expression: &str) -> AppResult<ConfidenceScore> {
        let mut scores = self.score_candidates(user_text, &[expression.to_string()])?;
        scores
            .pop()
            .ok_or_else(|| AppError::Internal("No confidence score produced".to_string()))
    }

    /// Scores `user_text` against every candidate, embedding the user text once.
    pub fn score_candidates(
        &self,
        user_text: &str,
        expressions: &[String],
    ) -> AppResult<Vec<ConfidenceScore>> {
        if user_text.trim().is_empty() {
            return Err(AppError::Input("User text must not be empty".to_string()));
        }
        if expressions.iter().any(|e| e.trim().is_empty()) {
            return Err(AppError::Input(
                "Candidate expression must not be empty".to_string(),
            ));
        }

        let embedder = self.context.embedder();
        let user_vector = embedder.embed_one(user_text)?;
        let expression_vectors = embedder.embed(expressions)?;
        if expression_vectors.len() != expressions.len() {
            return Err(AppError::ExternalService(format!(
                "Expected {} embeddings, got {}",
                expressions.len(),
                expression_vectors.len()
            )));
        }
        let intensity = self.context.sentiment().score(user_text)?.intensity;
        let user_lower = user_text.to_lowercase();

        Ok(expressions
            .iter()
            .zip(expression_vectors.iter())
            .map(|(expression, vector)| {
                ConfidenceScore::from_components(
                    cosine_similarity(&user_vector, vector),
                    fuzzy_ratio(&user_lower, &expression.to_lowercase()),
                    intensity,
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::context::TriageContext;

    #[test]
    fn test_fuzzy_ratio_bounds() {
        assert_eq!(fuzzy_ratio("tired", "tired"), 1.0);
        assert_eq!(fuzzy_ratio("abc", "xyz"), 0.0);
        assert_eq!(fuzzy_ratio("", "abc"), 0.0);
        let ratio = fuzzy_ratio("i can't sleep", "i cannot sleep");
        assert!(ratio > 0.8 && ratio < 1.0);
    }

    #[test]
    fn test_fuzzy_ratio_known_value() {
        // LCS("kitten", "sitting") = "ittn" → 2*4 / 13
        assert!((fuzzy_ratio("kitten", "sitting") - 8.0 / 13.0).abs() < 1e-6);
    }

    #[test]
    fn test_overall_is_weighted_sum() {
        let score = ConfidenceScore::from_components(0.8, 0.5, 0.4);
        let expected = 0.5 * 0.8 + 0.3 * 0.5 + 0.2 * 0.4;
        assert!((score.overall - expected).abs() < 1e-6);
    }

    #[test]
    fn test_scorer_rejects_empty_inputs() {
        let scorer = ConfidenceScorer::new(TriageContext::shared_for_tests());
        let empty_text = scorer.score("", "I'm so tired");
        let blank_expression = scorer.score("I'm tired", "  ");
        assert!(matches!(empty_text, Err(AppError::Input(_))));
        assert!(matches!(blank_expression, Err(AppError::Input(_))));
    }

    #[test]
    fn test_scorer_components_are_consistent() {
        let scorer = ConfidenceScorer::new(TriageContext::shared_for_tests());
        let score = scorer
            .score("I'm so tired all the time", "I'm so tired")
            .unwrap();
        let expected = 0.5 * score.semantic_similarity
            + 0.3 * score.fuzzy_match
            + 0.2 * score.sentiment_intensity;
        assert!((score.overall - expected).abs() < 1e-5);
        assert!((0.0..=1.0).contains(&score.fuzzy_match));
        assert!(score.semantic_similarity > 0.3);
    }

    #[test]
    fn test_batch_matches_single_scores() {
        let scorer = ConfidenceScorer::new(TriageContext::shared_for_tests());
        let expressions = vec!["I feel down".to_string(), "I can't sleep".to_string()];
        let batch = scorer
            .score_candidates("I can't sleep at all", &expressions)
            .unwrap();
        let single = scorer
            .score("I can't sleep at all", "I can't sleep")
            .unwrap();
        assert_eq!(batch.len(), 2);
        assert!((batch[1].overall - single.overall).abs() < 1e-6);
        assert!(batch[1].overall > batch[0].overall);
    }
}
