//! HTTP handlers for the chat endpoints.
//!
//! These handlers connect Axum routes to the conversation orchestrator.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Json, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::{ChatOrchestrator, UploadedFile};
use crate::domain::ChatError;

use super::dto::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for the chat handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Process start, reported by the liveness endpoint.
    pub started_at: Instant,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(orchestrator: Arc<ChatOrchestrator>) -> Self {
        Self {
            orchestrator,
            started_at: Instant::now(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /chat
// ════════════════════════════════════════════════════════════════════════════════

/// POST /chat - continue (or start) a conversation with a message.
///
/// # Errors
/// - 400 Bad Request: `message` missing or blank
/// - 500 Internal Server Error: completion call failed
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .orchestrator
        .chat(
            request.session_id.as_deref(),
            request.message.as_deref().unwrap_or(""),
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(ChatResponse {
            reply: outcome.reply,
            session_id: outcome.session_id.to_string(),
        }),
    ))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /chat/upload
// ════════════════════════════════════════════════════════════════════════════════

/// POST /chat/upload - ingest a document and answer a question about it.
///
/// Multipart fields: `file` (required), `sessionId` (optional), `message`
/// (optional; a default question is used when absent).
///
/// # Errors
/// - 400 Bad Request: no `file` part, empty payload, or malformed multipart body
/// - 500 Internal Server Error: ingestion step or completion call failed
pub async fn chat_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<UploadedFile> = None;
    let mut session_id: Option<String> = None;
    let mut message: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ChatError::invalid_input(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ChatError::invalid_input(format!("failed to read file part: {e}")))?;
                file = Some(UploadedFile {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "sessionId" => {
                session_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ChatError::invalid_input(format!("failed to read sessionId: {e}")))?,
                );
            }
            "message" => {
                message = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ChatError::invalid_input(format!("failed to read message: {e}")))?,
                );
            }
            // Unknown parts are ignored rather than rejected.
            _ => {}
        }
    }

    let outcome = state
        .orchestrator
        .chat_with_upload(session_id.as_deref(), file, message.as_deref())
        .await?;

    Ok((
        StatusCode::OK,
        Json(ChatResponse {
            reply: outcome.reply,
            session_id: outcome.session_id.to_string(),
        }),
    ))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /healthz
// ════════════════════════════════════════════════════════════════════════════════

/// GET /healthz - liveness only.
pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        uptime: state.started_at.elapsed().as_secs(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts the request taxonomy to HTTP responses.
#[derive(Debug)]
pub struct ApiError(ChatError);

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self.0 {
            ChatError::InvalidInput(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::invalid_input(message),
            ),
            ChatError::IngestionFailed(detail) => {
                tracing::error!(%detail, "ingestion failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::ingestion_failed(detail),
                )
            }
            ChatError::UpstreamLlm(detail) => {
                tracing::error!(%detail, "completion call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::upstream_llm(detail),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_400() {
        let response = ApiError(ChatError::invalid_input("message must not be blank"))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ingestion_failure_maps_to_500() {
        let response = ApiError(ChatError::IngestionFailed("container error".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_llm_failure_maps_to_500() {
        let response = ApiError(ChatError::UpstreamLlm("status 503".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
