//! Session Store Port - keyed access to per-conversation state.
//!
//! The store hands out a shared handle per session rather than raw state:
//! the orchestrator locks the handle for the whole request, which serializes
//! concurrent requests against the same session id and keeps the
//! read-then-append sequence on `history` strictly ordered.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{Session, SessionId};

/// Shared handle to one session's state.
///
/// The mutex is the per-session serialization point; it is held across the
/// request's external calls, not just the map access.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Port for session state storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolves a session id to its state, creating lazily.
    ///
    /// Total over the input space: absent or malformed tokens get a
    /// generated id; well-formed unknown tokens get a fresh empty session
    /// under that exact id.
    async fn resolve(&self, requested: Option<&str>) -> (SessionId, SessionHandle);

    /// Number of live sessions. Sessions are never evicted, so this is the
    /// hook for a future size bound.
    async fn session_count(&self) -> usize;
}
