//! Ingestion pipeline - persist an uploaded document and make it searchable.
//!
//! Three steps against two collaborators: ensure the storage container
//! exists, upload the bytes, trigger the indexing job. Each step can fail
//! independently; any failure surfaces as `IngestionFailed` with the
//! underlying cause and no rollback of earlier steps.

use std::sync::Arc;

use crate::domain::ChatError;
use crate::ports::{DocumentStore, IndexerTrigger, SearchIndex};

/// A document received from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename; becomes the session's scoping key.
    pub filename: String,
    /// Content type as declared by the client, if any.
    pub content_type: Option<String>,
    /// Raw document bytes.
    pub bytes: Vec<u8>,
}

/// Runs the storage-then-index sequence for uploaded documents.
pub struct IngestionPipeline {
    documents: Arc<dyn DocumentStore>,
    index: Arc<dyn SearchIndex>,
}

impl IngestionPipeline {
    /// Creates a new ingestion pipeline.
    pub fn new(documents: Arc<dyn DocumentStore>, index: Arc<dyn SearchIndex>) -> Self {
        Self { documents, index }
    }

    /// Ingests one document, returning its blob URL.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when the payload or filename is empty, before any
    ///   external call is made.
    /// - `IngestionFailed` when a storage or indexing step fails. An
    ///   uploaded blob is not deleted if the indexer trigger fails.
    pub async fn ingest(&self, file: &UploadedFile) -> Result<String, ChatError> {
        if file.filename.trim().is_empty() {
            return Err(ChatError::invalid_input("uploaded file must have a filename"));
        }
        if file.bytes.is_empty() {
            return Err(ChatError::invalid_input("uploaded file must not be empty"));
        }

        self.documents
            .ensure_container()
            .await
            .map_err(|e| ChatError::IngestionFailed(e.to_string()))?;

        let content_type = file
            .content_type
            .as_deref()
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| content_type_for(&file.filename));

        let url = self
            .documents
            .upload(&file.filename, file.bytes.clone(), content_type)
            .await
            .map_err(|e| ChatError::IngestionFailed(e.to_string()))?;

        match self
            .index
            .trigger_indexer()
            .await
            .map_err(|e| ChatError::IngestionFailed(e.to_string()))?
        {
            IndexerTrigger::Accepted => {
                tracing::info!(filename = %file.filename, "indexer run accepted");
            }
            IndexerTrigger::Skipped => {
                tracing::warn!(
                    filename = %file.filename,
                    "no indexer configured, document will not be searchable until indexed externally"
                );
            }
        }

        Ok(url)
    }
}

/// Infers a content type from the filename extension, falling back to a
/// generic document type.
fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("csv") => "text/csv",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}
