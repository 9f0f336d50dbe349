//! Document Store Port - interface to the external object storage service.

use async_trait::async_trait;
use thiserror::Error;

/// Port for blob/object storage interactions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Ensures the target container exists. Idempotent: succeeds whether the
    /// container was created by this call or already present.
    async fn ensure_container(&self) -> Result<(), StorageError>;

    /// Uploads document bytes under the given name, returning the blob URL.
    ///
    /// Overwrites any prior object of the same name - uploads are idempotent
    /// by filename, not content-addressed.
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// Object storage errors.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The storage connection string is absent; surfaces at request time.
    #[error("object storage is not configured")]
    NotConfigured,

    /// The connection string could not be parsed.
    #[error("invalid storage connection string: {0}")]
    InvalidConnectionString(String),

    /// The service rejected the request.
    #[error("storage service returned status {status}: {detail}")]
    Upstream { status: u16, detail: String },

    /// Network error during the request.
    #[error("storage network error: {0}")]
    Network(String),
}

impl StorageError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        StorageError::Network(message.into())
    }

    /// Creates an upstream rejection error.
    pub fn upstream(status: u16, detail: impl Into<String>) -> Self {
        StorageError::Upstream {
            status,
            detail: detail.into(),
        }
    }

    /// Returns true if retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Network(_) => true,
            StorageError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
