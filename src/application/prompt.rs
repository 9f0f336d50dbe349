//! Prompt assembly.
//!
//! Pure construction of the ordered message sequence sent to the language
//! model: instructions first, then the full prior history in chronological
//! order, then one new user message embedding the retrieved context and the
//! literal question. The ordering is what gives the conversation its memory
//! semantics; it must not change.

use crate::domain::{Turn, TurnRole};
use crate::ports::{Message, MessageRole};

/// Character budget for retrieved context embedded in a prompt. Bounds the
/// prompt size regardless of how much text retrieval returned.
pub const MAX_CONTEXT_CHARS: usize = 12_000;

/// Instructions establishing response style and formatting rules.
const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about documents \
the user has uploaded. Ground your answers in the provided context passages when they are \
relevant. When the context is empty or does not cover the question, answer from the \
conversation history and say so briefly. Be concise, answer in plain prose, and do not \
invent citations or facts that are not in the context.";

/// Builds the completion message sequence for one request.
///
/// Deterministic and free of I/O. The context is truncated to
/// [`MAX_CONTEXT_CHARS`] before embedding; an empty context is embedded
/// as-is and signals the model to rely on history alone.
pub fn build_messages(history: &[Turn], context: &str, question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(SYSTEM_PROMPT));

    for turn in history {
        let role = match turn.role {
            TurnRole::User => MessageRole::User,
            TurnRole::Assistant => MessageRole::Assistant,
        };
        messages.push(Message::new(role, turn.content.clone()));
    }

    let context = truncate_chars(context, MAX_CONTEXT_CHARS);
    messages.push(Message::user(format!(
        "Context:\n{context}\n\nQuestion: {question}"
    )));

    messages
}

/// Truncates to at most `max` characters, never splitting a code point.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
