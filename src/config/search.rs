//! Search service configuration

use serde::Deserialize;
use std::time::Duration;

/// Search/indexing service configuration (Azure AI Search)
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Service endpoint, e.g. `https://myservice.search.windows.net`
    pub endpoint: Option<String>,

    /// API key for the search service
    pub api_key: Option<String>,

    /// Index queried for document passages
    pub index: Option<String>,

    /// Indexer triggered after each upload; trigger is skipped when absent
    pub indexer: Option<String>,

    /// Semantic configuration name; semantic ranking is skipped when absent
    pub semantic_configuration: Option<String>,

    /// REST API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for idempotent query calls
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl SearchConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check whether all keys needed to query the service are present
    pub fn is_configured(&self) -> bool {
        let non_empty = |v: &Option<String>| v.as_ref().is_some_and(|s| !s.is_empty());
        non_empty(&self.endpoint) && non_empty(&self.api_key) && non_empty(&self.index)
    }

    /// Check whether semantic ranking can be requested
    pub fn has_semantic(&self) -> bool {
        self.semantic_configuration
            .as_ref()
            .is_some_and(|s| !s.is_empty())
    }

    /// Names of required keys that are absent or empty
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let empty = |v: &Option<String>| !v.as_ref().is_some_and(|s| !s.is_empty());
        if empty(&self.endpoint) {
            missing.push("SEARCH__ENDPOINT");
        }
        if empty(&self.api_key) {
            missing.push("SEARCH__API_KEY");
        }
        if empty(&self.index) {
            missing.push("SEARCH__INDEX");
        }
        missing
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            index: None,
            indexer: None,
            semantic_configuration: None,
            api_version: default_api_version(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_api_version() -> String {
    "2023-11-01".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.api_version, "2023-11-01");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 2);
        assert!(!config.is_configured());
        assert!(!config.has_semantic());
    }

    #[test]
    fn test_missing_keys_reports_each_absent_key() {
        let config = SearchConfig {
            index: Some("documents-index".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.missing_keys(),
            vec!["SEARCH__ENDPOINT", "SEARCH__API_KEY"]
        );
    }

    #[test]
    fn test_semantic_gated_on_configuration_name() {
        let mut config = SearchConfig {
            semantic_configuration: Some("default".to_string()),
            ..Default::default()
        };
        assert!(config.has_semantic());

        config.semantic_configuration = Some(String::new());
        assert!(!config.has_semantic());
    }

    #[test]
    fn test_indexer_is_optional() {
        let config = SearchConfig {
            endpoint: Some("https://svc.search.windows.net".to_string()),
            api_key: Some("key".to_string()),
            index: Some("documents-index".to_string()),
            ..Default::default()
        };
        assert!(config.is_configured());
        assert!(config.indexer.is_none());
        assert!(config.missing_keys().is_empty());
    }
}
