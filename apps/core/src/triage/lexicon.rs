//! Versioned symptom/disorder knowledge base.
//!
//! The default data set is compiled into the binary; a directory holding the
//! same seven files can replace it at startup (`HEADDOWELL_LEXICON_DIR`).
//! Everything is parsed once and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

pub const SYMPTOMS_FILE: &str = "symptoms.json";
pub const DISORDERS_FILE: &str = "disorders.json";
pub const SYNONYMS_FILE: &str = "curated_synonyms.json";
pub const THESAURUS_FILE: &str = "thesaurus.json";
pub const STOPWORDS_FILE: &str = "stopwords.txt";
pub const VOCABULARY_FILE: &str = "vocabulary.txt";
pub const SENTIMENT_FILE: &str = "sentiment_lexicon.tsv";

/// Canonical identity of a symptom name.
///
/// Case-insensitive, with `_`/`-` treated as spaces and whitespace collapsed,
/// so "Sleep Disturbance", "sleep_disturbance" and "sleep-disturbance" agree.
pub fn symptom_key(name: &str) -> String {
    name.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Raw text of every lexicon file, before parsing.
#[derive(Debug, Clone)]
pub struct LexiconAssets {
    pub symptoms: String,
    pub disorders: String,
    pub synonyms: String,
    pub thesaurus: String,
    pub stopwords: String,
    pub vocabulary: String,
    pub sentiment: String,
}

impl LexiconAssets {
    /// The data set bundled with the crate.
    pub fn embedded() -> Self {
        Self {
            symptoms: include_str!("../../data/lexicon/v1/symptoms.json").to_string(),
            disorders: include_str!("../../data/lexicon/v1/disorders.json").to_string(),
            synonyms: include_str!("../../data/lexicon/v1/curated_synonyms.json").to_string(),
            thesaurus: include_str!("../../data/lexicon/v1/thesaurus.json").to_string(),
            stopwords: include_str!("../../data/lexicon/v1/stopwords.txt").to_string(),
            vocabulary: include_str!("../../data/lexicon/v1/vocabulary.txt").to_string(),
            sentiment: include_str!("../../data/lexicon/v1/sentiment_lexicon.tsv").to_string(),
        }
    }

    /// Reads all seven files from `dir`. Every file must be present.
    pub fn from_dir(dir: &Path) -> AppResult<Self> {
        info!("Loading lexicon from {:?}", dir);
        let read = |name: &str| -> AppResult<String> {
            fs::read_to_string(dir.join(name)).map_err(|e| {
                AppError::Io(std::io::Error::new(
                    e.kind(),
                    format!("{}: {}", dir.join(name).display(), e),
                ))
            })
        };
        Ok(Self {
            symptoms: read(SYMPTOMS_FILE)?,
            disorders: read(DISORDERS_FILE)?,
            synonyms: read(SYNONYMS_FILE)?,
            thesaurus: read(THESAURUS_FILE)?,
            stopwords: read(STOPWORDS_FILE)?,
            vocabulary: read(VOCABULARY_FILE)?,
            sentiment: read(SENTIMENT_FILE)?,
        })
    }
}

#[derive(Deserialize)]
struct SymptomFile {
    version: String,
    symptoms: Vec<SymptomEntry>,
}

#[derive(Deserialize)]
struct SymptomEntry {
    name: String,
    expressions: Vec<String>,
}

#[derive(Deserialize)]
struct DisorderFile {
    version: String,
    disorders: Vec<DisorderEntry>,
}

#[derive(Deserialize)]
struct DisorderEntry {
    name: String,
    symptoms: Vec<String>,
    #[serde(default)]
    treatments: Vec<String>,
}

#[derive(Deserialize)]
struct SynonymFile {
    version: String,
    synonyms: BTreeMap<String, Vec<String>>,
}

/// A symptom with its characteristic first-person expressions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symptom {
    /// Display name as written in the lexicon ("Sleep Disturbance").
    pub name: String,
    /// Canonical key ("sleep disturbance").
    pub key: String,
    pub expressions: Vec<String>,
    /// Disorders listing this symptom, in disorder table order.
    pub disorders: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Disorder {
    pub name: String,
    /// Canonical symptom keys.
    pub symptoms: Vec<String>,
    pub treatments: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    version: String,
    symptoms: Vec<Symptom>,
    symptom_index: HashMap<String, usize>,
    disorders: Vec<Disorder>,
    disorder_index: HashMap<String, usize>,
    curated_synonyms: HashMap<String, Vec<String>>,
    stopwords: HashSet<String>,
    vocabulary: BTreeSet<String>,
    sentiment_valences: HashMap<String, f32>,
}

impl Lexicon {
    /// Parses the bundled data set.
    pub fn embedded() -> AppResult<Self> {
        Self::from_assets(&LexiconAssets::embedded())
    }

    pub fn from_assets(assets: &LexiconAssets) -> AppResult<Self> {
        let symptom_file: SymptomFile = serde_json::from_str(&assets.symptoms)?;
        let disorder_file: DisorderFile = serde_json::from_str(&assets.disorders)?;
        let synonym_file: SynonymFile = serde_json::from_str(&assets.synonyms)?;

        let version = symptom_file.version.clone();
        for (file, v) in [
            (DISORDERS_FILE, &disorder_file.version),
            (SYNONYMS_FILE, &synonym_file.version),
        ] {
            if *v != version {
                return Err(AppError::Data(format!(
                    "{} has version {} but {} has version {}",
                    file, v, SYMPTOMS_FILE, version
                )));
            }
        }

        // Symptoms: duplicate names merge their expression lists.
        let mut symptoms: Vec<Symptom> = Vec::new();
        let mut symptom_index = HashMap::new();
        for entry in symptom_file.symptoms {
            let key = symptom_key(&entry.name);
            if key.is_empty() {
                return Err(AppError::Data("Symptom with empty name".to_string()));
            }
            let expressions: Vec<String> = entry
                .expressions
                .into_iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
            match symptom_index.get(&key) {
                Some(&idx) => {
                    let existing: &mut Symptom = &mut symptoms[idx];
                    for expression in expressions {
                        if !existing.expressions.contains(&expression) {
                            existing.expressions.push(expression);
                        }
                    }
                }
                None => {
                    symptom_index.insert(key.clone(), symptoms.len());
                    symptoms.push(Symptom {
                        name: entry.name.trim().to_string(),
                        key,
                        expressions,
                        disorders: Vec::new(),
                    });
                }
            }
        }
        if let Some(empty) = symptoms.iter().find(|s| s.expressions.is_empty()) {
            return Err(AppError::Data(format!(
                "Symptom '{}' has no expressions",
                empty.name
            )));
        }

        // Disorders: a repeated name replaces the earlier treatments.
        let mut disorders: Vec<Disorder> = Vec::new();
        let mut disorder_index = HashMap::new();
        for entry in disorder_file.disorders {
            let name = entry.name.trim().to_lowercase();
            let disorder = Disorder {
                name: name.clone(),
                symptoms: dedup_keys(entry.symptoms.iter().map(|s| symptom_key(s))),
                treatments: entry.treatments,
            };
            if disorder.symptoms.is_empty() {
                return Err(AppError::Data(format!(
                    "Disorder '{}' lists no symptoms",
                    name
                )));
            }
            match disorder_index.get(&name) {
                Some(&idx) => disorders[idx] = disorder,
                None => {
                    disorder_index.insert(name, disorders.len());
                    disorders.push(disorder);
                }
            }
        }
        for disorder in &disorders {
            for key in &disorder.symptoms {
                if let Some(&idx) = symptom_index.get(key) {
                    symptoms[idx].disorders.push(disorder.name.clone());
                }
            }
        }

        // Curated synonyms: first occurrence of a key wins.
        let mut curated_synonyms: HashMap<String, Vec<String>> = HashMap::new();
        for (name, words) in synonym_file.synonyms {
            let words = words
                .into_iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect();
            curated_synonyms.entry(symptom_key(&name)).or_insert(words);
        }

        let stopwords: HashSet<String> = word_lines(&assets.stopwords).collect();
        let vocabulary: BTreeSet<String> = word_lines(&assets.vocabulary).collect();
        let sentiment_valences = parse_sentiment(&assets.sentiment)?;

        debug!(
            symptoms = symptoms.len(),
            disorders = disorders.len(),
            stopwords = stopwords.len(),
            valences = sentiment_valences.len(),
            "Lexicon parsed"
        );

        Ok(Self {
            version,
            symptoms,
            symptom_index,
            disorders,
            disorder_index,
            curated_synonyms,
            stopwords,
            vocabulary,
            sentiment_valences,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Symptoms that carry expressions, in file order.
    pub fn symptoms(&self) -> &[Symptom] {
        &self.symptoms
    }

    pub fn symptom(&self, name: &str) -> Option<&Symptom> {
        self.symptom_index
            .get(&symptom_key(name))
            .map(|&idx| &self.symptoms[idx])
    }

    /// Every symptom the knowledge base knows about.
    ///
    /// Lexicon symptoms keep their display name; symptoms that only appear in
    /// the disorder table are returned by key.
    pub fn known_symptom_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for symptom in &self.symptoms {
            if seen.insert(symptom.key.clone()) {
                names.push(symptom.name.clone());
            }
        }
        for disorder in &self.disorders {
            for key in &disorder.symptoms {
                if seen.insert(key.clone()) {
                    names.push(key.clone());
                }
            }
        }
        names
    }

    pub fn disorders(&self) -> &[Disorder] {
        &self.disorders
    }

    pub fn disorder(&self, name: &str) -> Option<&Disorder> {
        self.disorder_index
            .get(&name.trim().to_lowercase())
            .map(|&idx| &self.disorders[idx])
    }

    /// Disorders listing `symptom`, compared by canonical key.
    pub fn disorders_for(&self, symptom: &str) -> Vec<&Disorder> {
        let key = symptom_key(symptom);
        self.disorders
            .iter()
            .filter(|d| d.symptoms.contains(&key))
            .collect()
    }

    pub fn treatments(&self, disorder: &str) -> &[String] {
        self.disorder(disorder)
            .map(|d| d.treatments.as_slice())
            .unwrap_or(&[])
    }

    /// Curated synonym lists keyed by canonical symptom key.
    pub fn curated_synonym_map(&self) -> &HashMap<String, Vec<String>> {
        &self.curated_synonyms
    }

    pub fn stopwords(&self) -> &HashSet<String> {
        &self.stopwords
    }

    pub fn sentiment_valences(&self) -> &HashMap<String, f32> {
        &self.sentiment_valences
    }

    /// Words the spell checker accepts as correct.
    ///
    /// Base vocabulary plus stopwords (with and without apostrophes), every
    /// expression token, curated synonym words and sentiment lexicon words.
    pub fn spelling_vocabulary(&self) -> BTreeSet<String> {
        let mut words = self.vocabulary.clone();
        for stopword in &self.stopwords {
            words.insert(stopword.clone());
            words.insert(stopword.replace('\'', ""));
        }
        let phrases = self
            .symptoms
            .iter()
            .flat_map(|s| s.expressions.iter().chain(std::iter::once(&s.name)))
            .chain(self.curated_synonyms.values().flatten())
            .chain(self.sentiment_valences.keys());
        for phrase in phrases {
            words.extend(vocabulary_words(phrase));
        }
        words.retain(|w| !w.is_empty());
        words
    }
}

/// Lowercase alphabetic words of a phrase, apostrophes removed.
fn vocabulary_words(phrase: &str) -> impl Iterator<Item = String> + '_ {
    phrase
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '’'))
        .map(|w| w.replace(['\'', '’'], "").to_lowercase())
        .filter(|w| !w.is_empty())
}

fn dedup_keys(keys: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect()
}

/// Whitespace-separated lowercase words, ignoring `#` comment lines.
fn word_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(str::to_lowercase)
}

fn parse_sentiment(text: &str) -> AppResult<HashMap<String, f32>> {
    let mut valences = HashMap::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(word), Some(value)) = (fields.next(), fields.next()) else {
            return Err(AppError::Data(format!(
                "{} line {}: expected 'word<TAB>valence'",
                SENTIMENT_FILE,
                line_no + 1
            )));
        };
        let valence: f32 = value.parse().map_err(|_| {
            AppError::Data(format!(
                "{} line {}: invalid valence '{}'",
                SENTIMENT_FILE,
                line_no + 1,
                value
            ))
        })?;
        valences.insert(word.to_lowercase(), valence);
    }
    Ok(valences)
}
