use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Hard upper bound on a single message, in characters.
pub const MAX_INPUT_CHARS: usize = 5000;

/// A single free-text message submitted for analysis.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct AnalysisRequest {
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
}

impl AnalysisRequest {
    /// Builds a request, rejecting blank text and anything over `max_chars`.
    pub fn validated(text: impl Into<String>, max_chars: usize) -> AppResult<Self> {
        let request = Self { text: text.into() };
        let limit = max_chars.min(MAX_INPUT_CHARS);

        if request.text.trim().is_empty() {
            return Err(AppError::Input("Message text cannot be empty".to_string()));
        }
        if request.validate().is_err() || request.text.chars().count() > limit {
            return Err(AppError::Input(format!(
                "Message text is too long. Maximum length is {} characters",
                limit
            )));
        }
        Ok(request)
    }
}

/// Several answers from one conversation, analyzed together.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct ConversationRequest {
    #[validate(length(min = 1))]
    pub responses: Vec<String>,
}

impl ConversationRequest {
    /// Keeps the non-blank responses; fails when none remain.
    pub fn validated(responses: Vec<String>, max_chars: usize) -> AppResult<Self> {
        let responses: Vec<String> = responses
            .into_iter()
            .filter(|r| !r.trim().is_empty())
            .collect();
        let request = Self { responses };
        if request.validate().is_err() {
            return Err(AppError::Input(
                "Conversation must contain at least one response".to_string(),
            ));
        }
        for response in &request.responses {
            AnalysisRequest::validated(response.as_str(), max_chars)?;
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_text() {
        for text in ["", "   ", "\n\t"] {
            let err = AnalysisRequest::validated(text, MAX_INPUT_CHARS).unwrap_err();
            assert_eq!(err.public_message(), "Message text cannot be empty");
        }
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let at_limit = "é".repeat(MAX_INPUT_CHARS);
        let result = AnalysisRequest::validated(at_limit, MAX_INPUT_CHARS);
        assert!(result.is_ok());

        let over = "a".repeat(MAX_INPUT_CHARS + 1);
        let err = AnalysisRequest::validated(over, MAX_INPUT_CHARS).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.public_message().contains("5000"));
    }

    #[test]
    fn test_configured_limit_is_respected() {
        assert!(AnalysisRequest::validated("a".repeat(11), 10).is_err());
        assert!(AnalysisRequest::validated("a".repeat(10), 10).is_ok());
    }

    #[test]
    fn test_conversation_drops_blank_responses() {
        let request = ConversationRequest::validated(
            vec!["I feel sad".to_string(), "  ".to_string()],
            MAX_INPUT_CHARS,
        )
        .unwrap();
        assert_eq!(request.responses.len(), 1);

        let blank = vec![" ".to_string()];
        let result = ConversationRequest::validated(blank, MAX_INPUT_CHARS);
        assert!(result.is_err());
    }
}
