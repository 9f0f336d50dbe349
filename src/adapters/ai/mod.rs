//! Completion service adapters.

mod azure_openai;
mod mock_provider;

pub use azure_openai::{AzureOpenAiConfig, AzureOpenAiProvider};
pub use mock_provider::MockCompletionProvider;
