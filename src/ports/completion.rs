//! Completion Port - interface to the external language-model service.
//!
//! Provider-agnostic message format plus error types for the common failure
//! modes (auth, rate limits, timeouts). Unlike retrieval, completion errors
//! always propagate to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port for chat-completion interactions.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generates a reply for the assembled message sequence.
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError>;
}

/// A message in the completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions (guides model behavior).
    System,
    /// User input.
    User,
    /// Assistant (model) response.
    Assistant,
}

/// Completion service errors.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// Endpoint, key, or deployment is absent; surfaces at request time.
    #[error("completion service is not configured")]
    NotConfigured,

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Rate limited by the service.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// The service rejected the request.
    #[error("completion service returned status {status}: {detail}")]
    Upstream { status: u16, detail: String },

    /// Network error during the request.
    #[error("completion network error: {0}")]
    Network(String),

    /// Failed to parse the service response.
    #[error("completion parse error: {0}")]
    Parse(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },
}

impl CompletionError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        CompletionError::RateLimited { retry_after_secs }
    }

    /// Creates an upstream rejection error.
    pub fn upstream(status: u16, detail: impl Into<String>) -> Self {
        CompletionError::Upstream {
            status,
            detail: detail.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        CompletionError::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        CompletionError::Parse(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(Message::system("s").role, MessageRole::System);
        assert_eq!(Message::user("u").role, MessageRole::User);
        assert_eq!(Message::assistant("a").role, MessageRole::Assistant);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let msg = Message::user("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn errors_display_cause_detail() {
        let err = CompletionError::upstream(503, "service busy");
        assert_eq!(
            err.to_string(),
            "completion service returned status 503: service busy"
        );
    }
}
