//! Severity banding from aggregate confidence and sentiment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::sentiment::SentimentResult;
use crate::translation::{translate_or_original, Translator};

pub const CONFIDENCE_WEIGHT: f32 = 0.4;
pub const NEGATIVITY_WEIGHT: f32 = 0.3;
pub const INTENSITY_WEIGHT: f32 = 0.3;

/// Language used when a requested description is missing.
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Mild,
    Moderate,
    Severe,
}

struct SeverityBand {
    level: SeverityLevel,
    lower: f32,
    upper: f32,
    upper_inclusive: bool,
    descriptions: &'static [(&'static str, &'static str)],
}

impl SeverityBand {
    fn contains(&self, score: f32) -> bool {
        score >= self.lower
            && (score < self.upper || (self.upper_inclusive && score == self.upper))
    }
}

/// Half-open bands over [0, 1]; the last band includes 1.0.
const SEVERITY_BANDS: [SeverityBand; 3] = [
    SeverityBand {
        level: SeverityLevel::Mild,
        lower: 0.0,
        upper: 0.3,
        upper_inclusive: false,
        descriptions: &[
            ("en", "Mild - Symptoms are present but manageable"),
            ("ar", "خفيف - الأعراض موجودة ولكن يمكن التحكم بها"),
            ("fr", "Léger - Les symptômes sont présents mais gérables"),
        ],
    },
    SeverityBand {
        level: SeverityLevel::Moderate,
        lower: 0.3,
        upper: 0.6,
        upper_inclusive: false,
        descriptions: &[
            ("en", "Moderate - Symptoms significantly affect daily life"),
            ("ar", "متوسط - الأعراض تؤثر بشكل كبير على الحياة اليومية"),
            (
                "fr",
                "Modéré - Les symptômes affectent significativement la vie quotidienne",
            ),
        ],
    },
    SeverityBand {
        level: SeverityLevel::Severe,
        lower: 0.6,
        upper: 1.0,
        upper_inclusive: true,
        descriptions: &[
            (
                "en",
                "Severe - Symptoms are intense and greatly impact daily functioning",
            ),
            ("ar", "شديد - الأعراض شديدة وتؤثر بشكل كبير على الأداء اليومي"),
            (
                "fr",
                "Sévère - Les symptômes sont intenses et impactent fortement le fonctionnement quotidien",
            ),
        ],
    },
];

impl SeverityLevel {
    /// Band containing `score`, if any.
    pub fn for_score(score: f32) -> Option<Self> {
        SEVERITY_BANDS
            .iter()
            .find(|band| band.contains(score))
            .map(|band| band.level)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityLevel::Mild => "mild",
            SeverityLevel::Moderate => "moderate",
            SeverityLevel::Severe => "severe",
        }
    }

    fn band(&self) -> &'static SeverityBand {
        let index = match self {
            SeverityLevel::Mild => 0,
            SeverityLevel::Moderate => 1,
            SeverityLevel::Severe => 2,
        };
        &SEVERITY_BANDS[index]
    }

    /// Language code → description.
    pub fn descriptions(&self) -> BTreeMap<String, String> {
        self.band()
            .descriptions
            .iter()
            .map(|(lang, text)| (lang.to_string(), text.to_string()))
            .collect()
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityAssessment {
    pub level: SeverityLevel,
    pub score: f32,
    pub description: BTreeMap<String, String>,
}

impl SeverityAssessment {
    pub fn from_score(score: f32) -> Self {
        let level = SeverityLevel::for_score(score).unwrap_or(SeverityLevel::Moderate);
        Self {
            level,
            score,
            description: level.descriptions(),
        }
    }

    /// Stored description for `lang`, falling back to English.
    pub fn description(&self, lang: &str) -> &str {
        self.description
            .get(lang)
            .or_else(|| self.description.get(DEFAULT_LANGUAGE))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Description in any language: stored text when available, otherwise the
    /// English text machine-translated (or English when translation fails).
    pub async fn description_in(&self, lang: &str, translator: &dyn Translator) -> String {
        match self.description.get(lang) {
            Some(text) => text.clone(),
            None => {
                translate_or_original(translator, self.description(DEFAULT_LANGUAGE), lang).await
            }
        }
    }
}

/// `0.4 * confidence + 0.3 * (1 - compound) + 0.3 * intensity`, then banded.
pub fn severity_score(aggregate_confidence: f32, sentiment: &SentimentResult) -> f32 {
    CONFIDENCE_WEIGHT * aggregate_confidence
        + NEGATIVITY_WEIGHT * (1.0 - sentiment.raw_scores.compound)
        + INTENSITY_WEIGHT * sentiment.intensity
}

pub fn assess(aggregate_confidence: f32, sentiment: &SentimentResult) -> SeverityAssessment {
    SeverityAssessment::from_score(severity_score(aggregate_confidence, sentiment))
}
