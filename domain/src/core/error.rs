//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("unknown provider '{0}' (expected one of: openai, anthropic, ollama, gemini)")]
    InvalidProvider(String),

    #[error("unknown discussion role '{0}' (expected one of: generator, critic, refiner, evaluator)")]
    InvalidRole(String),

    #[error("model '{0}' not found in configuration")]
    UnknownModel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_role_display() {
        let error = DomainError::InvalidRole("moderator".to_string());
        assert!(error.to_string().contains("moderator"));
        assert!(error.to_string().contains("generator"));
    }

    #[test]
    fn test_unknown_model_display() {
        let error = DomainError::UnknownModel("openai/gpt-9".to_string());
        assert_eq!(
            error.to_string(),
            "model 'openai/gpt-9' not found in configuration"
        );
    }
}
