use serde::Serialize;
use std::io;
use thiserror::Error;
use tracing::error;

/// Message returned to callers for any failure that is not the caller's fault.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An error occurred while processing your message. Please try again later.";

/// Application-wide error type, consolidating all possible errors into a single enum.
#[derive(Debug, Error)]
pub enum AppError {
    /// The caller supplied unusable text (empty, blank, too long, wrong shape).
    #[error("Input error: {0}")]
    Input(String),

    /// An embedding model or remote service (translation) failed.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Represents configuration-related errors (e.g., malformed environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Lexicon or thesaurus data could not be parsed or is inconsistent.
    #[error("Lexicon data error: {0}")]
    Data(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the crate.
pub type AppResult<T> = Result<T, AppError>;

impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::Input(s) => AppError::Input(s.clone()),
            AppError::ExternalService(s) => AppError::ExternalService(s.clone()),
            AppError::Config(s) => AppError::Config(s.clone()),
            AppError::Data(s) => AppError::Data(s.clone()),
            AppError::Io(e) => AppError::Io(io::Error::new(e.kind(), e.to_string())),
            AppError::Internal(s) => AppError::Internal(s.clone()),
        }
    }
}

impl AppError {
    /// True when the failure was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::Input(_))
    }

    /// Message safe to show an end user. Internal details never leak.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Input(msg) => msg.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Converts into the caller-facing shape, logging anything unexpected.
    pub fn to_public(&self) -> PublicError {
        if !self.is_client_error() {
            error!(error = %self, "Analysis failed");
        }
        PublicError {
            kind: if self.is_client_error() {
                PublicErrorKind::InvalidInput
            } else {
                PublicErrorKind::ProcessingFailed
            },
            message: self.public_message(),
        }
    }
}

/// Error category exposed across the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicErrorKind {
    InvalidInput,
    ProcessingFailed,
}

/// Error payload exposed across the service boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicError {
    pub kind: PublicErrorKind,
    pub message: String,
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Data(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalService(format!("HTTP error: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::ExternalService(format!("Embedding error: {}", err))
    }
}
