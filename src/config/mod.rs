//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `DOSSIER_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use dossier::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod completion;
mod error;
mod search;
mod server;
mod storage;

pub use completion::CompletionConfig;
pub use error::{ConfigError, ValidationError};
pub use search::SearchConfig;
pub use server::{Environment, ServerConfig};
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the Dossier backend.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat-completion service configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Search/indexing service configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Object storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DOSSIER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DOSSIER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `DOSSIER__SEARCH__INDEX=documents` -> `search.index = documents`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    /// Absent service keys are NOT an error here; see [`AppConfig::missing_keys`].
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DOSSIER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Covers only values that would make the server itself unusable
    /// (listening setup, completion sampling parameters).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.completion.validate()?;
        Ok(())
    }

    /// Names of absent external-service keys, across all sections.
    ///
    /// The caller logs one error per entry and keeps serving; each missing
    /// section surfaces as a failed request against the capability it backs.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = self.completion.missing_keys();
        missing.extend(self.search.missing_keys());
        missing.extend(self.storage.missing_keys());
        missing
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set environment variables for testing
    /// Uses double underscores to separate nested config values
    fn set_minimal_env() {
        env::set_var(
            "DOSSIER__COMPLETION__ENDPOINT",
            "https://example.openai.azure.com",
        );
        env::set_var("DOSSIER__COMPLETION__API_KEY", "completion-key");
        env::set_var("DOSSIER__COMPLETION__DEPLOYMENT", "gpt-4o");
        env::set_var("DOSSIER__SEARCH__ENDPOINT", "https://svc.search.windows.net");
        env::set_var("DOSSIER__SEARCH__API_KEY", "search-key");
        env::set_var("DOSSIER__SEARCH__INDEX", "documents-index");
        env::set_var(
            "DOSSIER__STORAGE__CONNECTION_STRING",
            "DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=a2V5;EndpointSuffix=core.windows.net",
        );
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        env::remove_var("DOSSIER__COMPLETION__ENDPOINT");
        env::remove_var("DOSSIER__COMPLETION__API_KEY");
        env::remove_var("DOSSIER__COMPLETION__DEPLOYMENT");
        env::remove_var("DOSSIER__SEARCH__ENDPOINT");
        env::remove_var("DOSSIER__SEARCH__API_KEY");
        env::remove_var("DOSSIER__SEARCH__INDEX");
        env::remove_var("DOSSIER__STORAGE__CONNECTION_STRING");
        env::remove_var("DOSSIER__SERVER__PORT");
        env::remove_var("DOSSIER__SERVER__ENVIRONMENT");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.search.index.as_deref(), Some("documents-index"));
        assert_eq!(config.completion.deployment.as_deref(), Some("gpt-4o"));
        assert!(config.missing_keys().is_empty());
    }

    #[test]
    fn test_missing_service_keys_do_not_fail_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok());
        let config = result.unwrap();
        let missing = config.missing_keys();
        assert!(missing.contains(&"COMPLETION__ENDPOINT"));
        assert!(missing.contains(&"SEARCH__INDEX"));
        assert!(missing.contains(&"STORAGE__CONNECTION_STRING"));
    }

    #[test]
    fn test_server_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("DOSSIER__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_custom_server_port() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("DOSSIER__SERVER__PORT", "3000");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }
}
