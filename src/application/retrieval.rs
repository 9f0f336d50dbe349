//! Retrieval client - two-tier context fetch over the search port.
//!
//! Semantic ranking is attempted first when the index supports it; anything
//! that keeps it from producing passages (absent configuration, empty
//! results, a service error) falls through to the full-text tier. Only a
//! full-text failure surfaces as an error, and the orchestrator maps that
//! error to an empty context rather than failing the conversation - the
//! degradation is an explicit policy, not an incidental catch.

use std::sync::Arc;

use crate::ports::{SearchError, SearchIndex};

/// Result count cap for both search tiers.
pub const MAX_RESULTS: usize = 5;

/// Fetches passage context for a question, scoped to one document when a
/// scoping filename is known.
pub struct RetrievalClient {
    index: Arc<dyn SearchIndex>,
}

impl RetrievalClient {
    /// Creates a new retrieval client over a search index.
    pub fn new(index: Arc<dyn SearchIndex>) -> Self {
        Self { index }
    }

    /// Returns retrieved passages joined by blank lines, or an empty string
    /// when nothing was found. An `Err` means even the full-text tier
    /// failed; the caller decides what that degrades to.
    pub async fn fetch_context(
        &self,
        query: &str,
        scope: Option<&str>,
    ) -> Result<String, SearchError> {
        if self.index.supports_semantic() {
            match self.index.semantic_query(query, MAX_RESULTS).await {
                Ok(passages) if !passages.is_empty() => {
                    tracing::debug!(count = passages.len(), "semantic retrieval hit");
                    return Ok(join_passages(&passages));
                }
                Ok(_) => {
                    tracing::debug!("semantic retrieval empty, falling back to full-text");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "semantic retrieval failed, falling back to full-text");
                }
            }
        }

        let passages = self.index.lexical_query(query, MAX_RESULTS, scope).await?;
        tracing::debug!(count = passages.len(), scoped = scope.is_some(), "full-text retrieval");
        Ok(join_passages(&passages))
    }
}

fn join_passages(passages: &[String]) -> String {
    passages.join("\n\n")
}
