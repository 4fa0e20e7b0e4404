//! Runtime configuration read from the environment (and `.env` when present).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::error::{AppError, AppResult};
use crate::fs_manager::PortablePathManager;
use crate::models::MAX_INPUT_CHARS;

pub const ENV_LEXICON_DIR: &str = "HEADDOWELL_LEXICON_DIR";
pub const ENV_MODELS_DIR: &str = "HEADDOWELL_MODELS_DIR";
pub const ENV_EMBEDDER: &str = "HEADDOWELL_EMBEDDER";
pub const ENV_SURFACE_THRESHOLD: &str = "HEADDOWELL_SURFACE_THRESHOLD";
pub const ENV_MAX_INPUT_CHARS: &str = "HEADDOWELL_MAX_INPUT_CHARS";
pub const ENV_TRANSLATE_URL: &str = "HEADDOWELL_TRANSLATE_URL";
pub const ENV_TRANSLATE_API_KEY: &str = "HEADDOWELL_TRANSLATE_API_KEY";

/// Default overall confidence a symptom must exceed to be surfaced.
pub const DEFAULT_SURFACE_THRESHOLD: f32 = 0.3;

/// Which embedding backend the semantic similarity step uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbedderKind {
    /// AllMiniLML6V2 through fastembed, downloaded into the models dir.
    #[default]
    FastEmbed,
    /// Deterministic feature-hashing embedder, no model files required.
    Hashed,
}

impl FromStr for EmbedderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fastembed" | "minilm" => Ok(EmbedderKind::FastEmbed),
            "hashed" | "hash" => Ok(EmbedderKind::Hashed),
            other => Err(AppError::Config(format!(
                "Unknown embedder '{}', expected 'fastembed' or 'hashed'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Directory holding lexicon files that replace the embedded ones.
    pub lexicon_dir: Option<PathBuf>,
    pub models_dir: PathBuf,
    pub embedder: EmbedderKind,
    pub surface_threshold: f32,
    pub max_input_chars: usize,
    pub translate_url: Option<Url>,
    pub translate_api_key: Option<String>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            lexicon_dir: None,
            models_dir: PortablePathManager::models_dir(),
            embedder: EmbedderKind::default(),
            surface_threshold: DEFAULT_SURFACE_THRESHOLD,
            max_input_chars: MAX_INPUT_CHARS,
            translate_url: None,
            translate_api_key: None,
        }
    }
}

impl TriageConfig {
    /// Loads `.env` if present, then reads the environment.
    pub fn load() -> AppResult<Self> {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Reads configuration from process environment variables only.
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let surface_threshold =
            parse_var(ENV_SURFACE_THRESHOLD)?.unwrap_or(defaults.surface_threshold);
        if !(0.0..=1.0).contains(&surface_threshold) {
            return Err(AppError::Config(format!(
                "{} must be within [0, 1], got {}",
                ENV_SURFACE_THRESHOLD, surface_threshold
            )));
        }

        let max_input_chars = parse_var(ENV_MAX_INPUT_CHARS)?.unwrap_or(defaults.max_input_chars);
        if max_input_chars == 0 || max_input_chars > MAX_INPUT_CHARS {
            return Err(AppError::Config(format!(
                "{} must be between 1 and {}, got {}",
                ENV_MAX_INPUT_CHARS, MAX_INPUT_CHARS, max_input_chars
            )));
        }

        let translate_url = match non_empty_var(ENV_TRANSLATE_URL) {
            Some(raw) => Some(Url::parse(&raw)?),
            None => None,
        };

        Ok(Self {
            lexicon_dir: non_empty_var(ENV_LEXICON_DIR).map(PathBuf::from),
            models_dir: non_empty_var(ENV_MODELS_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            embedder: parse_var(ENV_EMBEDDER)?.unwrap_or(defaults.embedder),
            surface_threshold,
            max_input_chars,
            translate_url,
            translate_api_key: non_empty_var(ENV_TRANSLATE_API_KEY),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty_var(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| AppError::Config(format!("Invalid value for {}: {}", name, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 7] = [
        ENV_LEXICON_DIR,
        ENV_MODELS_DIR,
        ENV_EMBEDDER,
        ENV_SURFACE_THRESHOLD,
        ENV_MAX_INPUT_CHARS,
        ENV_TRANSLATE_URL,
        ENV_TRANSLATE_API_KEY,
    ];

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        ALL_VARS.iter().map(|name| (*name, None)).collect()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        temp_env::with_vars(cleared(), || {
            let config = TriageConfig::from_env().unwrap();
            assert!(config.lexicon_dir.is_none());
            assert_eq!(config.embedder, EmbedderKind::FastEmbed);
            assert!((config.surface_threshold - 0.3).abs() < f32::EPSILON);
            assert_eq!(config.max_input_chars, 5000);
            assert!(config.translate_url.is_none());
        });
    }

    #[test]
    fn test_reads_overrides() {
        let mut vars = cleared();
        vars.push((ENV_EMBEDDER, Some("hashed")));
        vars.push((ENV_SURFACE_THRESHOLD, Some("0.45")));
        vars.push((ENV_MAX_INPUT_CHARS, Some("1200")));
        vars.push((ENV_LEXICON_DIR, Some("/opt/headdowell/lexicon")));
        vars.push((ENV_TRANSLATE_URL, Some("http://localhost:5000")));
        temp_env::with_vars(vars, || {
            let config = TriageConfig::from_env().unwrap();
            assert_eq!(config.embedder, EmbedderKind::Hashed);
            assert!((config.surface_threshold - 0.45).abs() < 1e-6);
            assert_eq!(config.max_input_chars, 1200);
            assert_eq!(
                config.lexicon_dir,
                Some(PathBuf::from("/opt/headdowell/lexicon"))
            );
            assert_eq!(
                config.translate_url.map(|u| u.to_string()),
                Some("http://localhost:5000/".to_string())
            );
        });
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let mut vars = cleared();
        vars.push((ENV_SURFACE_THRESHOLD, Some("1.5")));
        temp_env::with_vars(vars, || {
            let err = TriageConfig::from_env().unwrap_err();
            assert!(matches!(err, AppError::Config(_)));
        });
    }

    #[test]
    fn test_rejects_unknown_embedder() {
        let mut vars = cleared();
        vars.push((ENV_EMBEDDER, Some("word2vec")));
        temp_env::with_vars(vars, || {
            assert!(matches!(
                TriageConfig::from_env(),
                Err(AppError::Config(_))
            ));
        });
    }

    #[test]
    fn test_rejects_raising_input_limit() {
        let mut vars = cleared();
        vars.push((ENV_MAX_INPUT_CHARS, Some("20000")));
        temp_env::with_vars(vars, || {
            assert!(TriageConfig::from_env().is_err());
        });
    }
}
