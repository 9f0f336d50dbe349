//! HTTP DTOs for the chat endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of a message-only chat request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Session token carried by the client; absent on the first request.
    #[serde(default)]
    pub session_id: Option<String>,
    /// User message. Missing or blank is rejected with 400.
    #[serde(default)]
    pub message: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Successful chat response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Generated assistant reply.
    pub reply: String,
    /// Session token to carry into the next request.
    pub session_id: String,
}

/// Liveness response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// Whole seconds since process start.
    pub uptime: u64,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            code: "INVALID_INPUT".to_string(),
            message: message.into(),
            detail: None,
        }
    }

    pub fn ingestion_failed(detail: impl Into<String>) -> Self {
        Self {
            code: "INGESTION_FAILED".to_string(),
            message: "Document ingestion failed".to_string(),
            detail: Some(detail.into()),
        }
    }

    pub fn upstream_llm(detail: impl Into<String>) -> Self {
        Self {
            code: "UPSTREAM_LLM_ERROR".to_string(),
            message: "Completion service request failed".to_string(),
            detail: Some(detail.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_accepts_camel_case_session_id() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"sessionId":"abc","message":"hello"}"#).unwrap();
        assert_eq!(request.session_id.as_deref(), Some("abc"));
        assert_eq!(request.message.as_deref(), Some("hello"));
    }

    #[test]
    fn chat_request_fields_are_optional() {
        let request: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(request.session_id.is_none());
        assert!(request.message.is_none());
    }

    #[test]
    fn chat_response_serializes_to_camel_case() {
        let response = ChatResponse {
            reply: "hi".to_string(),
            session_id: "abc".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"sessionId\":\"abc\""));
        assert!(json.contains("\"reply\":\"hi\""));
    }

    #[test]
    fn error_response_omits_absent_detail() {
        let json = serde_json::to_string(&ErrorResponse::invalid_input("bad")).unwrap();
        assert!(!json.contains("detail"));
        assert!(json.contains("INVALID_INPUT"));
    }

    #[test]
    fn error_response_carries_upstream_detail() {
        let json = serde_json::to_string(&ErrorResponse::upstream_llm("status 503: busy")).unwrap();
        assert!(json.contains("\"detail\":\"status 503: busy\""));
        assert!(json.contains("UPSTREAM_LLM_ERROR"));
    }
}
