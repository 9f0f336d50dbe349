//! Search Index Port - interface to the external search/indexing service.

use async_trait::async_trait;
use thiserror::Error;

/// Port for document search and index maintenance.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Whether semantic (meaning-ranked) queries can be issued.
    fn supports_semantic(&self) -> bool;

    /// Issues a semantic query, returning passage contents ranked by
    /// relevance. Only called when [`supports_semantic`] is true.
    ///
    /// [`supports_semantic`]: SearchIndex::supports_semantic
    async fn semantic_query(&self, text: &str, top: usize) -> Result<Vec<String>, SearchError>;

    /// Issues a full-text query, optionally filtered to passages whose
    /// stored filename equals `filename` exactly.
    async fn lexical_query(
        &self,
        text: &str,
        top: usize,
        filename: Option<&str>,
    ) -> Result<Vec<String>, SearchError>;

    /// Triggers the indexing job that makes uploaded documents searchable.
    ///
    /// Confirms only that the trigger was accepted, not that indexing has
    /// completed. Returns [`IndexerTrigger::Skipped`] when no indexer is
    /// configured.
    async fn trigger_indexer(&self) -> Result<IndexerTrigger, SearchError>;
}

/// Outcome of an indexer trigger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexerTrigger {
    /// The service accepted the run request.
    Accepted,
    /// No indexer is configured; nothing was triggered.
    Skipped,
}

/// Search service errors.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// Endpoint, key, or index name is absent; surfaces at request time.
    #[error("search service is not configured")]
    NotConfigured,

    /// The service rejected the request.
    #[error("search service returned status {status}: {detail}")]
    Upstream { status: u16, detail: String },

    /// Network error during the request.
    #[error("search network error: {0}")]
    Network(String),

    /// Failed to parse the service response.
    #[error("search parse error: {0}")]
    Parse(String),
}

impl SearchError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        SearchError::Network(message.into())
    }

    /// Creates an upstream rejection error.
    pub fn upstream(status: u16, detail: impl Into<String>) -> Self {
        SearchError::Upstream {
            status,
            detail: detail.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        SearchError::Parse(message.into())
    }

    /// Returns true if retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Network(_) => true,
            SearchError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
