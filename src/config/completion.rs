//! Completion service configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Chat-completion service configuration (Azure OpenAI deployment)
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    /// Service endpoint, e.g. `https://myresource.openai.azure.com`
    pub endpoint: Option<String>,

    /// API key for the completion service
    pub api_key: Option<String>,

    /// Deployment name addressed by the chat-completions route
    pub deployment: Option<String>,

    /// REST API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Sampling temperature for every completion
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output-length cap per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl CompletionConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check whether all keys needed to call the service are present
    pub fn is_configured(&self) -> bool {
        let non_empty = |v: &Option<String>| v.as_ref().is_some_and(|s| !s.is_empty());
        non_empty(&self.endpoint) && non_empty(&self.api_key) && non_empty(&self.deployment)
    }

    /// Names of required keys that are absent or empty
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let empty = |v: &Option<String>| !v.as_ref().is_some_and(|s| !s.is_empty());
        if empty(&self.endpoint) {
            missing.push("COMPLETION__ENDPOINT");
        }
        if empty(&self.api_key) {
            missing.push("COMPLETION__API_KEY");
        }
        if empty(&self.deployment) {
            missing.push("COMPLETION__DEPLOYMENT");
        }
        missing
    }

    /// Validate completion configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        Ok(())
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            deployment: None,
            api_version: default_api_version(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_version() -> String {
    "2024-02-01".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    800
}

fn default_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_config_defaults() {
        let config = CompletionConfig::default();
        assert_eq!(config.api_version, "2024-02-01");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 800);
        assert_eq!(config.timeout_secs, 60);
        assert!(!config.is_configured());
    }

    #[test]
    fn test_missing_keys_reports_each_absent_key() {
        let config = CompletionConfig {
            endpoint: Some("https://example.openai.azure.com".to_string()),
            ..Default::default()
        };
        let missing = config.missing_keys();
        assert_eq!(missing, vec!["COMPLETION__API_KEY", "COMPLETION__DEPLOYMENT"]);
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let config = CompletionConfig {
            endpoint: Some(String::new()),
            api_key: Some("key".to_string()),
            deployment: Some("gpt-4o".to_string()),
            ..Default::default()
        };
        assert!(!config.is_configured());
        assert_eq!(config.missing_keys(), vec!["COMPLETION__ENDPOINT"]);
    }

    #[test]
    fn test_fully_configured() {
        let config = CompletionConfig {
            endpoint: Some("https://example.openai.azure.com".to_string()),
            api_key: Some("key".to_string()),
            deployment: Some("gpt-4o".to_string()),
            ..Default::default()
        };
        assert!(config.is_configured());
        assert!(config.missing_keys().is_empty());
    }

    #[test]
    fn test_validation_rejects_bad_temperature() {
        let config = CompletionConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_max_tokens() {
        let config = CompletionConfig {
            max_tokens: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_duration() {
        let config = CompletionConfig {
            timeout_secs: 30,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }
}
