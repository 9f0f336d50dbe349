//! Object storage adapters.

mod azure_blob;

pub use azure_blob::{AzureBlobConfig, AzureBlobStore};
