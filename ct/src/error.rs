//! Template error types

use thiserror::Error;

/// Errors raised while registering templates, building conversations, or rendering prompts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Unknown chat template: {name}")]
    UnknownTemplate { name: String },

    #[error("Unsupported message role: '{role}' (expected system, user or assistant)")]
    UnsupportedRole { role: String },

    #[error("Malformed content: {0}")]
    MalformedContent(String),

    #[error("Malformed template '{name}': {reason}")]
    MalformedTemplate { name: String, reason: String },

    #[error("Cannot render a conversation with no messages")]
    EmptyConversation,
}

impl TemplateError {
    pub(crate) fn malformed_template(name: &str, reason: impl Into<String>) -> Self {
        TemplateError::MalformedTemplate {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this error was caused by the incoming request rather than by configuration
    pub fn is_request_error(&self) -> bool {
        match self {
            TemplateError::UnknownTemplate { .. } => true,
            TemplateError::UnsupportedRole { .. } => true,
            TemplateError::MalformedContent(_) => true,
            TemplateError::EmptyConversation => true,
            TemplateError::MalformedTemplate { .. } => false,
        }
    }

    /// Check if this error points at a broken template definition
    pub fn is_config_error(&self) -> bool {
        matches!(self, TemplateError::MalformedTemplate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_template_message() {
        let err = TemplateError::UnknownTemplate {
            name: "qwen9-vl".to_string(),
        };
        assert!(err.to_string().contains("qwen9-vl"));
    }

    #[test]
    fn test_unsupported_role_message() {
        let err = TemplateError::UnsupportedRole {
            role: "tool".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'tool'"));
        assert!(msg.contains("assistant"));
    }

    #[test]
    fn test_error_classification() {
        assert!(TemplateError::EmptyConversation.is_request_error());
        assert!(TemplateError::MalformedContent("x".to_string()).is_request_error());
        assert!(!TemplateError::EmptyConversation.is_config_error());

        let err = TemplateError::malformed_template("broken", "missing sep2");
        assert!(err.is_config_error());
        assert!(!err.is_request_error());
        assert_eq!(err.to_string(), "Malformed template 'broken': missing sep2");
    }
}
