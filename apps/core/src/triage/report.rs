//! Output records of the triage engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::confidence::ConfidenceScore;
use super::disorders::DisorderFinding;
use super::sentiment::SentimentResult;
use super::severity::SeverityAssessment;

/// A surfaced symptom, repeated once per disorder that lists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedSymptom {
    pub symptom: String,
    pub disorder: String,
    pub confidence: ConfidenceScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    /// Highest overall confidence among surfaced symptoms (0 when none).
    pub max_confidence: f32,
}

/// Full result of analyzing one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis_id: String,
    pub sentiment: SentimentResult,
    pub detected_symptoms: Vec<DetectedSymptom>,
    /// Present only when at least one symptom was surfaced.
    pub severity_assessment: Option<SeverityAssessment>,
    pub confidence_scores: ConfidenceSummary,
    /// Symptoms found by the phrase/variant extractor.
    pub extracted_symptoms: BTreeSet<String>,
    /// Disorder → percent likelihood from the extracted symptoms.
    pub disorder_scores: BTreeMap<String, f32>,
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn has_findings(&self) -> bool {
        !self.detected_symptoms.is_empty() || !self.extracted_symptoms.is_empty()
    }

    /// Distinct surfaced symptom names.
    pub fn surfaced_symptoms(&self) -> BTreeSet<&str> {
        self.detected_symptoms
            .iter()
            .map(|d| d.symptom.as_str())
            .collect()
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let surfaced = self.surfaced_symptoms();
        let severity = self
            .severity_assessment
            .as_ref()
            .map(|s| s.level.label())
            .unwrap_or("none");
        if surfaced.is_empty() {
            format!(
                "sentiment={} symptoms=none severity={}",
                self.sentiment.label, severity
            )
        } else {
            format!(
                "sentiment={} symptoms={} severity={} max_confidence={:.2}",
                self.sentiment.label,
                surfaced.into_iter().collect::<Vec<_>>().join(", "),
                severity,
                self.confidence_scores.max_confidence
            )
        }
    }
}

/// Result of analyzing several responses from one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationReport {
    pub analysis_id: String,
    pub response_count: usize,
    pub sentiment: SentimentResult,
    pub extracted_symptoms: BTreeSet<String>,
    pub disorder_scores: BTreeMap<String, f32>,
    /// Disorders above the reporting threshold, strongest first.
    pub findings: Vec<DisorderFinding>,
    pub timestamp: DateTime<Utc>,
}
