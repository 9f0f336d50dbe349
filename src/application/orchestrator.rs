//! Conversation orchestrator - per-request control flow.
//!
//! Two entry transitions share one tail: resolve the session (holding its
//! lock for the whole request), retrieve context, build the prompt, invoke
//! completion, and append the exchange. The upload transition runs ingestion
//! first and scopes retrieval to the new document; an ingestion failure
//! aborts before any retrieval or completion work.
//!
//! History is appended only after a successful completion, so a client retry
//! after a failure does not duplicate turns. Re-sending a successful request
//! does append duplicate turns and invokes the model again - replays are not
//! deduplicated.

use std::sync::Arc;

use crate::domain::{ChatError, SessionId};
use crate::ports::{CompletionProvider, SessionStore};

use super::ingestion::{IngestionPipeline, UploadedFile};
use super::prompt;
use super::retrieval::RetrievalClient;

/// Question used when an upload arrives without an accompanying message.
pub const DEFAULT_UPLOAD_QUESTION: &str = "Give me a brief summary of this document.";

/// Result of a successful conversation request.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Session the exchange was appended to; echoed to the client so it can
    /// carry the token into its next request.
    pub session_id: SessionId,
    /// Generated assistant reply.
    pub reply: String,
}

/// Top-level request orchestration over the four ports.
pub struct ChatOrchestrator {
    sessions: Arc<dyn SessionStore>,
    ingestion: IngestionPipeline,
    retrieval: RetrievalClient,
    completion: Arc<dyn CompletionProvider>,
}

impl ChatOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        ingestion: IngestionPipeline,
        retrieval: RetrievalClient,
        completion: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            sessions,
            ingestion,
            retrieval,
            completion,
        }
    }

    /// Continuation transition: answer a message within an existing (or
    /// lazily created) session, scoping retrieval to the session's current
    /// document when one is set.
    pub async fn chat(
        &self,
        session_id: Option<&str>,
        message: &str,
    ) -> Result<ChatOutcome, ChatError> {
        let question = message.trim();
        if question.is_empty() {
            // Rejected before the session map is touched.
            return Err(ChatError::invalid_input("message must not be blank"));
        }

        let (session_id, handle) = self.sessions.resolve(session_id).await;
        let mut session = handle.lock().await;

        let scope = session.current_file().map(str::to_string);
        self.converse(session_id, &mut session, scope.as_deref(), question)
            .await
    }

    /// New-document transition: ingest the upload, then answer the message
    /// (or the default question) with retrieval scoped to the new document.
    pub async fn chat_with_upload(
        &self,
        session_id: Option<&str>,
        file: Option<UploadedFile>,
        message: Option<&str>,
    ) -> Result<ChatOutcome, ChatError> {
        // Rejected before any storage or search call.
        let file = file.ok_or_else(|| ChatError::invalid_input("file part is required"))?;

        let question = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_QUESTION);

        let (session_id, handle) = self.sessions.resolve(session_id).await;
        let mut session = handle.lock().await;

        let url = self.ingestion.ingest(&file).await?;
        tracing::info!(session = %session_id, filename = %file.filename, %url, "document ingested");
        session.set_current_file(&file.filename);

        self.converse(session_id, &mut session, Some(&file.filename), question)
            .await
    }

    /// Shared tail: retrieve, prompt, complete, append.
    async fn converse(
        &self,
        session_id: SessionId,
        session: &mut crate::domain::Session,
        scope: Option<&str>,
        question: &str,
    ) -> Result<ChatOutcome, ChatError> {
        let context = match self.retrieval.fetch_context(question, scope).await {
            Ok(context) => context,
            Err(err) => {
                // Deliberate policy: retrieval never fails the conversation.
                tracing::warn!(session = %session_id, error = %err, "retrieval degraded to empty context");
                String::new()
            }
        };

        let messages = prompt::build_messages(session.history(), &context, question);
        let reply = self
            .completion
            .complete(&messages)
            .await
            .map_err(|e| ChatError::UpstreamLlm(e.to_string()))?;

        session.append_exchange(question, &reply);

        Ok(ChatOutcome { session_id, reply })
    }
}
