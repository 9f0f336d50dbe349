//! Conversation session state.
//!
//! A session is keyed by an opaque client-carried token and holds the
//! scoping filename of the most recently ingested document plus the ordered
//! conversation history. History grows only in user+assistant pairs and is
//! never reordered or truncated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted length for a client-supplied session token.
const MAX_TOKEN_LEN: usize = 128;

/// Opaque session identifier.
///
/// Client-supplied tokens are accepted as-is when well-formed; otherwise a
/// fresh UUID token is generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a new random session token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accepts a client-supplied token if well-formed, generating otherwise.
    ///
    /// Well-formed means 1..=128 characters drawn from `[A-Za-z0-9_-]`.
    /// Unknown-but-well-formed tokens are kept verbatim so a client keeps
    /// its session id across server restarts.
    pub fn resolve(requested: Option<&str>) -> Self {
        match requested {
            Some(token) if Self::is_well_formed(token) => Self(token.to_string()),
            _ => Self::generate(),
        }
    }

    /// Checks token well-formedness.
    pub fn is_well_formed(token: &str) -> bool {
        !token.is_empty()
            && token.len() <= MAX_TOKEN_LEN
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single turn in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: TurnRole,
    /// Turn content.
    pub content: String,
}

impl Turn {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Per-session conversation state.
#[derive(Debug, Clone)]
pub struct Session {
    current_file: Option<String>,
    history: Vec<Turn>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates an empty session.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            current_file: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Filename scoping retrieval, set by the most recent upload.
    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    /// Associates an ingested document with this session, replacing any
    /// previous association. History is preserved.
    pub fn set_current_file(&mut self, filename: impl Into<String>) {
        self.current_file = Some(filename.into());
        self.updated_at = Utc::now();
    }

    /// Ordered conversation history.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Appends one completed exchange: the user turn followed by the
    /// assistant turn. This is the only mutation path for history, so the
    /// pair invariant holds by construction.
    pub fn append_exchange(&mut self, question: impl Into<String>, reply: impl Into<String>) {
        self.history.push(Turn::user(question));
        self.history.push(Turn::assistant(reply));
        self.updated_at = Utc::now();
    }

    /// When the session was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the session last changed.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
