//! Symptom name → alternative surface forms.

use lru::LruCache;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::lexicon::{symptom_key, Lexicon};
use crate::error::AppResult;

const VARIANT_CACHE_SIZE: usize = 256;

/// Word-sense lexical database: a term maps to lemma sets, one per sense.
pub trait Thesaurus: Send + Sync {
    /// Raw lemma names over every sense of `term` (may contain underscores).
    fn lemmas(&self, term: &str) -> Vec<String>;

    /// Single words the thesaurus knows, for the spelling dictionary.
    fn vocabulary(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Deserialize)]
struct ThesaurusFile {
    synsets: HashMap<String, Vec<Vec<String>>>,
}

/// Thesaurus backed by the bundled WordNet extract.
#[derive(Debug, Clone, Default)]
pub struct StaticThesaurus {
    synsets: HashMap<String, Vec<Vec<String>>>,
}

impl StaticThesaurus {
    pub fn from_json(json: &str) -> AppResult<Self> {
        let file: ThesaurusFile = serde_json::from_str(json)?;
        let synsets = file
            .synsets
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Ok(Self { synsets })
    }

    pub fn len(&self) -> usize {
        self.synsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.synsets.is_empty()
    }

    /// Exact lookup first, then simple plural reductions.
    fn senses(&self, term: &str) -> Option<&Vec<Vec<String>>> {
        let key = term.trim().to_lowercase().replace(' ', "_");
        if let Some(senses) = self.synsets.get(&key) {
            return Some(senses);
        }
        let reductions = [
            key.strip_suffix("ies").map(|stem| format!("{}y", stem)),
            key.strip_suffix("es").map(str::to_string),
            key.strip_suffix('s').map(str::to_string),
        ];
        reductions
            .into_iter()
            .flatten()
            .find_map(|candidate| self.synsets.get(&candidate))
    }
}

impl Thesaurus for StaticThesaurus {
    fn lemmas(&self, term: &str) -> Vec<String> {
        self.senses(term)
            .map(|senses| senses.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    fn vocabulary(&self) -> Vec<String> {
        self.synsets
            .iter()
            .flat_map(|(key, senses)| std::iter::once(key).chain(senses.iter().flatten()))
            .filter(|lemma| lemma.chars().all(char::is_alphabetic))
            .map(|lemma| lemma.to_lowercase())
            .collect()
    }
}

/// Unions the thesaurus and curated synonym lists for a symptom name.
pub struct VariantExpander {
    thesaurus: Arc<dyn Thesaurus>,
    curated: HashMap<String, Vec<String>>,
    cache: Mutex<LruCache<String, Arc<BTreeSet<String>>>>,
}

impl VariantExpander {
    pub fn new(thesaurus: Arc<dyn Thesaurus>, lexicon: &Lexicon) -> Self {
        Self {
            thesaurus,
            curated: lexicon.curated_synonym_map().clone(),
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(VARIANT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Lowercased variants of `symptom_name`; always includes the name itself.
    pub fn expand(&self, symptom_name: &str) -> Arc<BTreeSet<String>> {
        {
            let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(hit) = cache.get(symptom_name) {
                return Arc::clone(hit);
            }
        }

        let mut variants = BTreeSet::new();
        let lowered = symptom_name.to_lowercase();
        let key = symptom_key(symptom_name);
        variants.insert(lowered.clone());
        variants.insert(key.clone());

        for lemma in self.thesaurus.lemmas(&lowered) {
            variants.insert(lemma.replace('_', " ").to_lowercase());
        }
        if let Some(words) = self.curated.get(&key) {
            variants.extend(words.iter().cloned());
        }
        variants.retain(|v| !v.is_empty());

        debug!(
            symptom = symptom_name,
            count = variants.len(),
            "Expanded variants"
        );
        let variants = Arc::new(variants);
        let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        cache.put(symptom_name.to_string(), Arc::clone(&variants));
        variants
    }
}
