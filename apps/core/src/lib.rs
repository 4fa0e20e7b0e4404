//! HeadDoWell core: symptom detection and sentiment triage.
//!
//! Build a [`TriageEngine`] once (it loads the lexicon and embedding model),
//! then call [`TriageEngine::analyze`] per message.

pub mod config;
pub mod error;
pub mod fs_manager;
pub mod models;
pub mod translation;
pub mod triage;

#[cfg(test)]
mod tests;

pub use config::{EmbedderKind, TriageConfig};
pub use error::{AppError, AppResult, PublicError};
pub use triage::{AnalysisReport, ConversationReport, TriageContext, TriageEngine};
