//! Search service adapters.

mod azure_search;

pub use azure_search::{AzureSearchClient, AzureSearchConfig};
