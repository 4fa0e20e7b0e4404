//! Disorder likelihoods from detected symptoms.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::context::TriageContext;
use super::lexicon::symptom_key;

/// Percentage points added at full sentiment intensity.
pub const INTENSITY_BONUS: f32 = 20.0;
pub const MAX_PERCENT: f32 = 100.0;
/// Findings at or below this percentage are not reported.
pub const REPORTING_THRESHOLD: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStrength {
    Mild,
    Moderate,
    Significant,
}

impl FindingStrength {
    pub fn for_percent(percent: f32) -> Self {
        if percent > 75.0 {
            FindingStrength::Significant
        } else if percent > 50.0 {
            FindingStrength::Moderate
        } else {
            FindingStrength::Mild
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisorderFinding {
    pub disorder: String,
    pub confidence: f32,
    pub strength: FindingStrength,
    pub treatments: Vec<String>,
}

pub struct DisorderAggregator {
    context: Arc<TriageContext>,
}

impl DisorderAggregator {
    pub fn new(context: Arc<TriageContext>) -> Self {
        Self { context }
    }

    /// Percent likelihood per disorder, using the intensity of `context_text`.
    ///
    /// Blank context text contributes no intensity.
    pub fn aggregate<S: AsRef<str>>(
        &self,
        detected: &[S],
        context_text: &str,
    ) -> BTreeMap<String, f32> {
        let intensity = self.context.sentiment().intensity(context_text);
        self.aggregate_with_intensity(detected, intensity)
    }

    /// `100 * matching / |symptoms| + 20 * intensity`, clamped to 100.
    /// Disorders with no matching symptom are omitted.
    pub fn aggregate_with_intensity<S: AsRef<str>>(
        &self,
        detected: &[S],
        intensity: f32,
    ) -> BTreeMap<String, f32> {
        let detected: HashSet<String> = detected.iter().map(|s| symptom_key(s.as_ref())).collect();
        self.context
            .lexicon()
            .disorders()
            .iter()
            .filter_map(|disorder| {
                let matching = disorder
                    .symptoms
                    .iter()
                    .filter(|s| detected.contains(*s))
                    .count();
                if matching == 0 {
                    return None;
                }
                let percent = MAX_PERCENT * matching as f32 / disorder.symptoms.len() as f32
                    + INTENSITY_BONUS * intensity;
                Some((disorder.name.clone(), percent.min(MAX_PERCENT)))
            })
            .collect()
    }

    /// Scores above the reporting threshold, strongest first, with treatments.
    pub fn findings(&self, scores: &BTreeMap<String, f32>) -> Vec<DisorderFinding> {
        let lexicon = self.context.lexicon();
        let mut findings: Vec<DisorderFinding> = scores
            .iter()
            .filter(|(_, percent)| **percent > REPORTING_THRESHOLD)
            .map(|(disorder, percent)| DisorderFinding {
                disorder: disorder.clone(),
                confidence: *percent,
                strength: FindingStrength::for_percent(*percent),
                treatments: lexicon.treatments(disorder).to_vec(),
            })
            .collect();
        findings.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.disorder.cmp(&b.disorder))
        });
        findings
    }
}
