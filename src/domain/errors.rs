//! Request error taxonomy.
//!
//! Three kinds cover every failed request: bad input, a failed ingestion
//! step, and a failed completion call. Retrieval failures are deliberately
//! absent — they degrade to an empty context instead of failing the request.

use thiserror::Error;

/// Errors a conversation request can surface to the client.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    /// A required request field is missing or blank.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A storage or indexing step of document ingestion failed.
    #[error("ingestion failed: {0}")]
    IngestionFailed(String),

    /// The completion call failed. Never degraded silently — the reply is
    /// the primary deliverable of the request.
    #[error("completion service error: {0}")]
    UpstreamLlm(String),
}

impl ChatError {
    /// Stable machine-readable code for HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::InvalidInput(_) => "INVALID_INPUT",
            ChatError::IngestionFailed(_) => "INGESTION_FAILED",
            ChatError::UpstreamLlm(_) => "UPSTREAM_LLM_ERROR",
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ChatError::InvalidInput(message.into())
    }
}
