//! Triage engine - main orchestrator for the triage module.
//!
//! Validates the message, scores sentiment, scores every lexicon symptom
//! against the message, surfaces the confident ones per owning disorder and
//! attaches severity, extraction and disorder likelihoods.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::confidence::{ConfidenceScore, ConfidenceScorer};
use super::context::TriageContext;
use super::disorders::DisorderAggregator;
use super::extractor::SymptomExtractor;
use super::report::{AnalysisReport, ConfidenceSummary, ConversationReport, DetectedSymptom};
use super::severity::assess;
use crate::config::{TriageConfig, DEFAULT_SURFACE_THRESHOLD};
use crate::error::AppResult;
use crate::models::{AnalysisRequest, ConversationRequest, MAX_INPUT_CHARS};

pub struct TriageEngine {
    context: Arc<TriageContext>,
    extractor: SymptomExtractor,
    scorer: ConfidenceScorer,
    aggregator: DisorderAggregator,
    surface_threshold: f32,
    max_input_chars: usize,
}

impl TriageEngine {
    pub fn new(context: Arc<TriageContext>) -> Self {
        Self {
            extractor: SymptomExtractor::new(Arc::clone(&context)),
            scorer: ConfidenceScorer::new(Arc::clone(&context)),
            aggregator: DisorderAggregator::new(Arc::clone(&context)),
            context,
            surface_threshold: DEFAULT_SURFACE_THRESHOLD,
            max_input_chars: MAX_INPUT_CHARS,
        }
    }

    pub fn with_surface_threshold(mut self, threshold: f32) -> Self {
        self.surface_threshold = threshold;
        self
    }

    pub fn with_max_input_chars(mut self, max_chars: usize) -> Self {
        self.max_input_chars = max_chars;
        self
    }

    pub fn from_config(config: &TriageConfig) -> AppResult<Self> {
        let context = Arc::new(TriageContext::from_config(config)?);
        Ok(Self::new(context)
            .with_surface_threshold(config.surface_threshold)
            .with_max_input_chars(config.max_input_chars))
    }

    pub fn context(&self) -> &Arc<TriageContext> {
        &self.context
    }

    pub fn extractor(&self) -> &SymptomExtractor {
        &self.extractor
    }

    pub fn aggregator(&self) -> &DisorderAggregator {
        &self.aggregator
    }

    /// Analyzes one message.
    pub fn analyze(&self, text: &str) -> AppResult<AnalysisReport> {
        let start = Instant::now();
        let request = AnalysisRequest::validated(text, self.max_input_chars)?;
        let text = request.text.as_str();

        let sentiment = self.context.sentiment().score(text)?;
        let lexicon = self.context.lexicon();

        // Score every expression in one batch, then keep each symptom's best.
        let symptoms = lexicon.symptoms();
        let expressions: Vec<String> = symptoms
            .iter()
            .flat_map(|s| s.expressions.iter().cloned())
            .collect();
        let scores = self.scorer.score_candidates(text, &expressions)?;

        let mut detected_symptoms = Vec::new();
        let mut max_confidence: Option<f32> = None;
        let mut offset = 0;
        for symptom in symptoms {
            let count = symptom.expressions.len();
            let best = best_score(&scores[offset..offset + count]);
            offset += count;

            let Some(best) = best else { continue };
            if best.overall <= self.surface_threshold {
                continue;
            }
            if symptom.disorders.is_empty() {
                debug!(symptom = %symptom.name, "Confident symptom has no disorder, skipped");
                continue;
            }
            let overall = best.overall;
            max_confidence = Some(max_confidence.map_or(overall, |m: f32| m.max(overall)));
            for disorder in &symptom.disorders {
                detected_symptoms.push(DetectedSymptom {
                    symptom: symptom.name.clone(),
                    disorder: disorder.clone(),
                    confidence: best,
                });
            }
        }

        let severity_assessment = max_confidence.map(|max| assess(max, &sentiment));

        let extracted_symptoms = self
            .extractor
            .extract(text, lexicon.known_symptom_names());
        let extracted: Vec<&String> = extracted_symptoms.iter().collect();
        let disorder_scores = self
            .aggregator
            .aggregate_with_intensity(extracted.as_slice(), sentiment.intensity);

        let report = AnalysisReport {
            analysis_id: Uuid::new_v4().to_string(),
            sentiment,
            detected_symptoms,
            severity_assessment,
            confidence_scores: ConfidenceSummary {
                max_confidence: max_confidence.unwrap_or(0.0),
            },
            extracted_symptoms,
            disorder_scores,
            processing_time_ms: start.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        };

        info!(
            analysis_id = %report.analysis_id,
            extracted = report.extracted_symptoms.len(),
            elapsed_ms = report.processing_time_ms,
            "Analysis complete: {}",
            report.summary()
        );

        Ok(report)
    }

    /// Analyzes the responses of one conversation together.
    ///
    /// Symptoms are extracted from the combined text; disorder likelihoods use
    /// the intensity of that same text and are reported above 30%.
    pub fn analyze_conversation(&self, responses: &[String]) -> AppResult<ConversationReport> {
        let request = ConversationRequest::validated(responses.to_vec(), self.max_input_chars)?;
        let combined = request.responses.join(" ");

        let sentiment = self.context.sentiment().score(&combined)?;
        let known = self.context.lexicon().known_symptom_names();
        let extracted_symptoms = self.extractor.extract(&combined, known);
        let extracted: Vec<&String> = extracted_symptoms.iter().collect();
        let disorder_scores: BTreeMap<String, f32> = self
            .aggregator
            .aggregate_with_intensity(extracted.as_slice(), sentiment.intensity);
        let findings = self.aggregator.findings(&disorder_scores);

        info!(
            responses = request.responses.len(),
            extracted = extracted_symptoms.len(),
            findings = findings.len(),
            "Conversation analysis complete"
        );

        Ok(ConversationReport {
            analysis_id: Uuid::new_v4().to_string(),
            response_count: request.responses.len(),
            sentiment,
            extracted_symptoms,
            disorder_scores,
            findings,
            timestamp: Utc::now(),
        })
    }
}

/// Highest overall score; the first wins ties.
fn best_score(scores: &[ConfidenceScore]) -> Option<ConfidenceScore> {
    scores.iter().copied().fold(None, |best, score| match best {
        Some(b) if b.overall >= score.overall => Some(b),
        _ => Some(score),
    })
}
