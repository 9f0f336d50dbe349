//! Mock Completion Provider for testing.
//!
//! Configurable mock implementation of the CompletionProvider port, allowing
//! tests (and keyless local runs) to exercise the conversation loop without
//! calling a real model.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockCompletionProvider::new()
//!     .with_reply("Hello, I'm the assistant!");
//!
//! let reply = provider.complete(&messages).await?;
//! assert_eq!(reply, "Hello, I'm the assistant!");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{CompletionError, CompletionProvider, Message};

/// Default reply returned when no scripted responses remain.
const DEFAULT_REPLY: &str = "This is a mock reply.";

/// Mock completion provider.
///
/// Scripted responses are consumed in order; once exhausted, a fixed default
/// reply is returned. Every call is recorded for verification.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<Result<String, CompletionError>>>>,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockCompletionProvider {
    /// Creates a new mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(content.into()));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: CompletionError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Message lists of every call made so far.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError> {
        self.calls.lock().unwrap().push(messages.to_vec());

        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(DEFAULT_REPLY.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_replies_are_consumed_in_order() {
        let provider = MockCompletionProvider::new()
            .with_reply("first")
            .with_reply("second");

        assert_eq!(provider.complete(&[]).await.unwrap(), "first");
        assert_eq!(provider.complete(&[]).await.unwrap(), "second");
        assert_eq!(provider.complete(&[]).await.unwrap(), DEFAULT_REPLY);
    }

    #[tokio::test]
    async fn scripted_error_is_returned() {
        let provider =
            MockCompletionProvider::new().with_error(CompletionError::upstream(500, "boom"));

        assert!(provider.complete(&[]).await.is_err());
    }

    #[tokio::test]
    async fn calls_are_recorded() {
        let provider = MockCompletionProvider::new();
        provider
            .complete(&[Message::user("hello")])
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.calls()[0][0].content, "hello");
    }
}
