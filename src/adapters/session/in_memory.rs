//! In-Memory Session Store Adapter
//!
//! Process-wide session map behind an async `RwLock`. Each entry is an
//! `Arc<Mutex<Session>>` handle; the map lock is held only for lookup and
//! insertion, while the per-session mutex serializes whole requests against
//! one session id. Sessions live until process restart - there is no
//! eviction.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{Session, SessionId};
use crate::ports::{SessionHandle, SessionStore};

/// In-memory session storage.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored sessions (useful for tests).
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn resolve(&self, requested: Option<&str>) -> (SessionId, SessionHandle) {
        let id = SessionId::resolve(requested);

        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(&id) {
                return (id, handle.clone());
            }
        }

        let mut sessions = self.sessions.write().await;
        // A racing request may have inserted between the read and write lock.
        let handle = sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
            .clone();
        (id, handle)
    }

    async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn resolve_creates_lazily_and_reuses() {
        let store = InMemorySessionStore::new();

        let (id, handle) = store.resolve(Some("alpha")).await;
        assert_eq!(id.as_str(), "alpha");
        handle.lock().await.append_exchange("q", "a");

        let (_, again) = store.resolve(Some("alpha")).await;
        assert_eq!(again.lock().await.history().len(), 2);
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn malformed_id_gets_generated_token() {
        let store = InMemorySessionStore::new();

        let (id, _) = store.resolve(Some("not a token!")).await;
        assert_ne!(id.as_str(), "not a token!");
        assert!(SessionId::is_well_formed(id.as_str()));
    }

    #[tokio::test]
    async fn absent_id_gets_fresh_session_each_time() {
        let store = InMemorySessionStore::new();

        let (a, _) = store.resolve(None).await;
        let (b, _) = store.resolve(None).await;
        assert_ne!(a, b);
        assert_eq!(store.session_count().await, 2);
    }

    #[tokio::test]
    async fn per_session_lock_serializes_exchanges() {
        let store = InMemorySessionStore::new();
        let (_, handle) = store.resolve(Some("shared")).await;

        let mut tasks = Vec::new();
        for i in 0..8 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                let mut session = handle.lock().await;
                let question = format!("q{i}");
                // The pair append happens under one lock acquisition, so
                // interleaved tasks can never split a pair.
                session.append_exchange(question, format!("a{i}"));
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let session = handle.lock().await;
        assert_eq!(session.history().len(), 16);
        for pair in session.history().chunks(2) {
            assert_eq!(pair[0].role, crate::domain::TurnRole::User);
            assert_eq!(pair[1].role, crate::domain::TurnRole::Assistant);
            assert_eq!(&pair[0].content[1..], &pair[1].content[1..]);
        }
    }

    proptest! {
        #[test]
        fn history_length_is_always_twice_the_exchange_count(
            exchanges in proptest::collection::vec(("[a-z]{1,16}", "[a-z]{1,16}"), 0..32)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            runtime.block_on(async {
                let store = InMemorySessionStore::new();
                let (_, handle) = store.resolve(Some("prop")).await;
                let mut session = handle.lock().await;
                for (q, a) in &exchanges {
                    session.append_exchange(q.clone(), a.clone());
                }
                prop_assert_eq!(session.history().len(), exchanges.len() * 2);
                Ok(())
            })?;
        }
    }
}
