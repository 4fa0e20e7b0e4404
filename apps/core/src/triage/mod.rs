//! # Triage Module
//!
//! Symptom detection and sentiment triage for free-text messages.
//!
//! ## Components
//! - `lexicon`: Versioned symptom/disorder/synonym tables
//! - `context`: Immutable shared resources (`TriageContext`)
//! - `normalizer`: Emoji, punctuation, stopword and spelling normalization
//! - `segmenter`: Clause splitting on connectives and punctuation
//! - `variants`: Thesaurus + curated synonym expansion
//! - `sentiment`: Rule-based polarity scoring
//! - `semantic`: Sentence embeddings and cosine similarity
//! - `confidence`: Weighted semantic/fuzzy/sentiment confidence
//! - `extractor`: Phrase-overlap and variant symptom extraction
//! - `severity`: Severity banding with localized descriptions
//! - `disorders`: Disorder likelihood aggregation
//! - `report`: Output data structures
//! - `engine`: Main orchestrator

pub mod confidence;
pub mod context;
pub mod disorders;
pub mod engine;
pub mod extractor;
pub mod lexicon;
pub mod normalizer;
pub mod report;
pub mod segmenter;
pub mod semantic;
pub mod sentiment;
pub mod severity;
pub mod variants;

// Re-export main types for convenience
pub use confidence::{fuzzy_ratio, ConfidenceScore, ConfidenceScorer};
pub use context::TriageContext;
pub use disorders::{DisorderAggregator, DisorderFinding, FindingStrength};
pub use engine::TriageEngine;
pub use extractor::{ContextCue, DetectionSource, SymptomExtractor, SymptomMatch};
pub use lexicon::{symptom_key, Disorder, Lexicon, LexiconAssets, Symptom};
pub use normalizer::{SpellChecker, TextNormalizer};
pub use report::{AnalysisReport, ConfidenceSummary, ConversationReport, DetectedSymptom};
pub use segmenter::segment;
pub use semantic::{cosine_similarity, Embedder, FastEmbedder, HashedEmbedder};
pub use sentiment::{PolarityScores, SentimentAnalyzer, SentimentLabel, SentimentResult};
pub use severity::{assess, SeverityAssessment, SeverityLevel};
pub use variants::{StaticThesaurus, Thesaurus, VariantExpander};
