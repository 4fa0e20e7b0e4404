//! Sentence embeddings for the semantic-similarity part of confidence scoring.
//!
//! `FastEmbedder` runs AllMiniLML6V2 locally. `HashedEmbedder` is a
//! deterministic bag-of-words stand-in used when the model is unavailable.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::config::EmbedderKind;
use crate::error::{AppError, AppResult};
use crate::fs_manager::PortablePathManager;

/// Output width of AllMiniLML6V2; the hashed embedder matches it.
pub const EMBEDDING_DIM: usize = 384;

pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// One vector per input, same order.
    fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ExternalService("Embedder returned no vector".to_string()))
    }
}

pub struct FastEmbedder {
    model: TextEmbedding,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl FastEmbedder {
    const CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(size) => size,
        None => panic!("Cache size must be non-zero"),
    };

    /// Loads (downloading on first use) the model under `models_dir/embeddings`.
    pub fn try_new(models_dir: &Path) -> AppResult<Self> {
        let embeddings_dir = PortablePathManager::init(models_dir)?;
        let mut options = InitOptions::new(EmbeddingModel::AllMiniLML6V2);
        options.show_download_progress = false;
        options.cache_dir = embeddings_dir;

        let model = TextEmbedding::try_new(options)?;
        info!("Embedding model loaded successfully");
        Ok(Self {
            model,
            cache: Mutex::new(LruCache::new(Self::CACHE_SIZE)),
        })
    }
}

impl Embedder for FastEmbedder {
    fn name(&self) -> &str {
        "all-minilm-l6-v2"
    }

    fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut misses: Vec<String> = Vec::new();
        {
            let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
            for text in texts {
                match cache.get(text) {
                    Some(vector) => results.push(Some(vector.clone())),
                    None => {
                        if !misses.contains(text) {
                            misses.push(text.clone());
                        }
                        results.push(None);
                    }
                }
            }
        }

        if !misses.is_empty() {
            let vectors = self.model.embed(misses.clone(), None)?;
            if vectors.len() != misses.len() {
                return Err(AppError::ExternalService(format!(
                    "Expected {} embeddings, got {}",
                    misses.len(),
                    vectors.len()
                )));
            }
            let mut cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
            for (text, vector) in misses.iter().zip(vectors) {
                cache.put(text.clone(), vector);
            }
            for (slot, text) in results.iter_mut().zip(texts) {
                if slot.is_none() {
                    *slot = cache.get(text).cloned();
                }
            }
        }

        results
            .into_iter()
            .map(|v| {
                v.ok_or_else(|| AppError::Internal("Embedding evicted before use".to_string()))
            })
            .collect()
    }
}

/// Feature-hashing embedder over words and character trigrams.
///
/// Texts sharing vocabulary get positive cosine similarity; unrelated texts
/// land near zero. Needs no model files.
#[derive(Debug, Clone, Default)]
pub struct HashedEmbedder;

impl HashedEmbedder {
    fn fnv1a(bytes: &[u8]) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in bytes {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        hash
    }

    fn add_feature(vector: &mut [f32], feature: &str, weight: f32) {
        let hash = Self::fnv1a(feature.as_bytes());
        let index = (hash % EMBEDDING_DIM as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; EMBEDDING_DIM];
        let lowered = text.to_lowercase();
        let words = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty());
        for word in words {
            Self::add_feature(&mut vector, word, 1.0);
            let padded: Vec<char> = format!("#{}#", word).chars().collect();
            for trigram in padded.windows(3) {
                let trigram: String = trigram.iter().collect();
                Self::add_feature(&mut vector, &trigram, 0.5);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Embedder for HashedEmbedder {
    fn name(&self) -> &str {
        "hashed-bow"
    }

    fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }
}

/// Builds the configured embedder, falling back to hashing if the model cannot load.
pub fn load_embedder(kind: EmbedderKind, models_dir: &Path) -> Arc<dyn Embedder> {
    match kind {
        EmbedderKind::Hashed => Arc::new(HashedEmbedder),
        EmbedderKind::FastEmbed => match FastEmbedder::try_new(models_dir) {
            Ok(embedder) => Arc::new(embedder),
            Err(e) => {
                warn!(
                    "Failed to load embedding model, using hashed embeddings instead: {}",
                    e
                );
                Arc::new(HashedEmbedder)
            }
        },
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
