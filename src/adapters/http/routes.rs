//! Axum routes for the chat endpoints.
//!
//! Defines the routing table for the REST surface.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use super::handlers::{chat, chat_upload, healthz, AppState};

/// Creates the route table.
///
/// REST Endpoints:
/// - POST /chat - answer a message within a session
/// - POST /chat/upload - ingest a document, then answer a message about it
/// - GET /healthz - liveness
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/upload", post(chat_upload))
        .route("/healthz", get(healthz))
}

/// Complete application router with the upload body limit applied.
pub fn app_router(state: AppState, max_upload_bytes: usize) -> Router {
    chat_routes()
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_routes_creates_valid_router() {
        let _routes = chat_routes();
    }
}
