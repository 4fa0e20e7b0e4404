//! Shared, read-only resources for every triage component.
//!
//! Built once at startup and passed around behind an `Arc`. Only the memo
//! caches inside the embedder and variant expander mutate, and they never
//! change results.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::lexicon::{Lexicon, LexiconAssets};
use super::normalizer::{SpellChecker, TextNormalizer};
use super::semantic::{load_embedder, Embedder};
use super::sentiment::SentimentAnalyzer;
use super::variants::{StaticThesaurus, Thesaurus, VariantExpander};
use crate::config::TriageConfig;
use crate::error::AppResult;

/// A lexicon expression with its normalized tokens, computed once.
#[derive(Debug, Clone)]
pub struct NormalizedExpression {
    pub text: String,
    /// Normalized tokens, duplicates kept.
    pub tokens: Vec<String>,
    pub token_set: HashSet<String>,
}

pub struct TriageContext {
    lexicon: Lexicon,
    normalizer: TextNormalizer,
    sentiment: SentimentAnalyzer,
    variants: VariantExpander,
    embedder: Arc<dyn Embedder>,
    /// Parallel to `lexicon.symptoms()`.
    expressions: Vec<Vec<NormalizedExpression>>,
}

impl TriageContext {
    pub fn new(
        lexicon: Lexicon,
        thesaurus: Arc<dyn Thesaurus>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let start = Instant::now();

        let mut vocabulary = lexicon.spelling_vocabulary();
        vocabulary.extend(thesaurus.vocabulary());
        let normalizer = TextNormalizer::new(lexicon.stopwords(), SpellChecker::new(vocabulary));

        let expressions = lexicon
            .symptoms()
            .iter()
            .map(|symptom| {
                symptom
                    .expressions
                    .iter()
                    .map(|text| {
                        let tokens = normalizer.normalize(text);
                        NormalizedExpression {
                            text: text.clone(),
                            token_set: tokens.iter().cloned().collect(),
                            tokens,
                        }
                    })
                    .collect()
            })
            .collect();

        let sentiment = SentimentAnalyzer::new(lexicon.sentiment_valences().clone());
        let variants = VariantExpander::new(thesaurus, &lexicon);

        info!(
            version = lexicon.version(),
            symptoms = lexicon.symptoms().len(),
            disorders = lexicon.disorders().len(),
            embedder = embedder.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Triage context ready"
        );

        Self {
            lexicon,
            normalizer,
            sentiment,
            variants,
            embedder,
            expressions,
        }
    }

    pub fn from_assets(assets: &LexiconAssets, embedder: Arc<dyn Embedder>) -> AppResult<Self> {
        let lexicon = Lexicon::from_assets(assets)?;
        let thesaurus = StaticThesaurus::from_json(&assets.thesaurus)?;
        if thesaurus.is_empty() {
            warn!("Thesaurus is empty, using curated synonyms only");
        } else {
            debug!(terms = thesaurus.len(), "Thesaurus loaded");
        }
        Ok(Self::new(lexicon, Arc::new(thesaurus), embedder))
    }

    /// Bundled lexicon with the given embedder.
    pub fn embedded(embedder: Arc<dyn Embedder>) -> AppResult<Self> {
        Self::from_assets(&LexiconAssets::embedded(), embedder)
    }

    /// Lexicon directory override and embedder choice from configuration.
    pub fn from_config(config: &TriageConfig) -> AppResult<Self> {
        let assets = match &config.lexicon_dir {
            Some(dir) => LexiconAssets::from_dir(dir)?,
            None => LexiconAssets::embedded(),
        };
        let embedder = load_embedder(config.embedder, &config.models_dir);
        Self::from_assets(&assets, embedder)
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn sentiment(&self) -> &SentimentAnalyzer {
        &self.sentiment
    }

    pub fn variants(&self) -> &VariantExpander {
        &self.variants
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Normalized expressions of the symptom at `index` in `lexicon().symptoms()`.
    pub fn expressions(&self, index: usize) -> &[NormalizedExpression] {
        self.expressions
            .get(index)
            .map(|e| e.as_slice())
            .unwrap_or(&[])
    }

    /// One context over the bundled lexicon and hashed embeddings, shared by tests.
    #[cfg(test)]
    pub fn shared_for_tests() -> Arc<TriageContext> {
        use std::sync::OnceLock;

        use super::semantic::HashedEmbedder;

        static CONTEXT: OnceLock<Arc<TriageContext>> = OnceLock::new();
        CONTEXT
            .get_or_init(|| {
                Arc::new(
                    TriageContext::embedded(Arc::new(HashedEmbedder))
                        .expect("bundled lexicon loads"),
                )
            })
            .clone()
    }
}
