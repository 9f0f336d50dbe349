//! Object storage configuration

use serde::Deserialize;
use std::time::Duration;

/// Object storage configuration (Azure Blob Storage)
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Account connection string
    /// (`DefaultEndpointsProtocol=...;AccountName=...;AccountKey=...;EndpointSuffix=...`)
    pub connection_string: Option<String>,

    /// Container uploaded documents are written to
    #[serde(default = "default_container")]
    pub container: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl StorageConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check whether the account connection string is present
    pub fn is_configured(&self) -> bool {
        self.connection_string
            .as_ref()
            .is_some_and(|s| !s.is_empty())
    }

    /// Names of required keys that are absent or empty
    pub fn missing_keys(&self) -> Vec<&'static str> {
        if self.is_configured() {
            Vec::new()
        } else {
            vec!["STORAGE__CONNECTION_STRING"]
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            container: default_container(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_container() -> String {
    "documents".to_string()
}

fn default_timeout() -> u64 {
    60
}
