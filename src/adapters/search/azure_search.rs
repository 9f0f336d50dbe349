//! Azure AI Search Client - passage retrieval and indexer triggering.
//!
//! Speaks the documents-search and indexer-run REST routes with `api-key`
//! header auth. Queries are idempotent, so transient failures are retried
//! with exponential backoff; the indexer trigger is attempted exactly once.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::SearchConfig;
use crate::ports::{IndexerTrigger, SearchError, SearchIndex};

/// Index field holding passage text.
const CONTENT_FIELD: &str = "content";

/// Index field holding the source document's filename; the only field the
/// scoping filter may reference.
const FILENAME_FIELD: &str = "metadata_storage_name";

/// Configuration for the Azure AI Search client.
#[derive(Debug, Clone)]
pub struct AzureSearchConfig {
    /// Service endpoint (e.g. `https://myservice.search.windows.net`).
    pub endpoint: String,
    /// API key for authentication.
    api_key: Secret<String>,
    /// Index queried for passages.
    pub index: String,
    /// Indexer triggered after uploads, when present.
    pub indexer: Option<String>,
    /// Semantic configuration name, when semantic ranking is available.
    pub semantic_configuration: Option<String>,
    /// REST API version.
    pub api_version: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries for query calls.
    pub max_retries: u32,
}

impl AzureSearchConfig {
    /// Creates a new configuration.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        index: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: Secret::new(api_key.into()),
            index: index.into(),
            indexer: None,
            semantic_configuration: None,
            api_version: "2023-11-01".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }

    /// Sets the indexer name.
    pub fn with_indexer(mut self, indexer: impl Into<String>) -> Self {
        self.indexer = Some(indexer.into());
        self
    }

    /// Sets the semantic configuration name.
    pub fn with_semantic_configuration(mut self, name: impl Into<String>) -> Self {
        self.semantic_configuration = Some(name.into());
        self
    }

    /// Sets the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count for queries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Azure AI Search adapter.
///
/// Built unconfigured when required keys are absent; every call then fails
/// with `NotConfigured`. Retrieval treats that like any other search
/// failure and degrades, while ingestion surfaces it as a failed step.
pub struct AzureSearchClient {
    config: Option<AzureSearchConfig>,
    client: Client,
}

impl AzureSearchClient {
    /// Creates a client with the given configuration.
    pub fn new(config: AzureSearchConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config: Some(config),
            client,
        }
    }

    /// Builds a client from the typed settings section, unconfigured when
    /// any required key is absent.
    pub fn from_settings(settings: &SearchConfig) -> Self {
        match (&settings.endpoint, &settings.api_key, &settings.index) {
            (Some(endpoint), Some(api_key), Some(index)) if settings.is_configured() => {
                let mut config = AzureSearchConfig::new(endpoint, api_key, index)
                    .with_api_version(settings.api_version.clone())
                    .with_timeout(settings.timeout())
                    .with_max_retries(settings.max_retries);
                if let Some(indexer) = settings.indexer.clone().filter(|s| !s.is_empty()) {
                    config = config.with_indexer(indexer);
                }
                if let Some(semantic) = settings
                    .semantic_configuration
                    .clone()
                    .filter(|s| !s.is_empty())
                {
                    config = config.with_semantic_configuration(semantic);
                }
                Self::new(config)
            }
            _ => Self {
                config: None,
                client: Client::new(),
            },
        }
    }

    /// Builds the documents-search URL.
    fn search_url(config: &AzureSearchConfig) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            config.endpoint, config.index, config.api_version
        )
    }

    /// Builds the indexer-run URL.
    fn indexer_url(config: &AzureSearchConfig, indexer: &str) -> String {
        format!(
            "{}/indexers/{}/run?api-version={}",
            config.endpoint, indexer, config.api_version
        )
    }

    /// Exact-match scoping filter over the stored filename field.
    fn filename_filter(filename: &str) -> String {
        // OData string literals escape single quotes by doubling them.
        format!("{} eq '{}'", FILENAME_FIELD, filename.replace('\'', "''"))
    }

    /// Runs one query with bounded retry on transient failures.
    async fn run_query(
        &self,
        config: &AzureSearchConfig,
        body: &SearchRequest<'_>,
    ) -> Result<Vec<String>, SearchError> {
        let mut attempt = 0;
        loop {
            match self.execute_query(config, body).await {
                Ok(passages) => return Ok(passages),
                Err(err) => {
                    if !err.is_retryable() || attempt >= config.max_retries {
                        return Err(err);
                    }
                    let delay = Duration::from_secs(1 << attempt);
                    tracing::debug!(error = %err, attempt, "retrying search query");
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Sends one query request and parses passage contents.
    async fn execute_query(
        &self,
        config: &AzureSearchConfig,
        body: &SearchRequest<'_>,
    ) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .post(Self::search_url(config))
            .header("api-key", config.api_key())
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| SearchError::network(e.to_string()))?;

        let response = Self::handle_response_status(response).await?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::parse(format!("Failed to parse response: {}", e)))?;

        Ok(parsed
            .value
            .into_iter()
            .filter_map(|hit| hit.content)
            .filter(|content| !content.is_empty())
            .collect())
    }

    /// Parses the API response status and maps errors.
    async fn handle_response_status(response: Response) -> Result<Response, SearchError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(SearchError::upstream(status.as_u16(), error_body))
    }
}

#[async_trait]
impl SearchIndex for AzureSearchClient {
    fn supports_semantic(&self) -> bool {
        self.config
            .as_ref()
            .is_some_and(|c| c.semantic_configuration.is_some())
    }

    async fn semantic_query(&self, text: &str, top: usize) -> Result<Vec<String>, SearchError> {
        let config = self.config.as_ref().ok_or(SearchError::NotConfigured)?;
        let semantic = config
            .semantic_configuration
            .as_deref()
            .ok_or(SearchError::NotConfigured)?;

        let body = SearchRequest {
            search: text,
            top,
            select: CONTENT_FIELD,
            query_type: Some("semantic"),
            semantic_configuration: Some(semantic),
            filter: None,
        };
        self.run_query(config, &body).await
    }

    async fn lexical_query(
        &self,
        text: &str,
        top: usize,
        filename: Option<&str>,
    ) -> Result<Vec<String>, SearchError> {
        let config = self.config.as_ref().ok_or(SearchError::NotConfigured)?;

        let body = SearchRequest {
            search: text,
            top,
            select: CONTENT_FIELD,
            query_type: None,
            semantic_configuration: None,
            filter: filename.map(Self::filename_filter),
        };
        self.run_query(config, &body).await
    }

    async fn trigger_indexer(&self) -> Result<IndexerTrigger, SearchError> {
        let config = self.config.as_ref().ok_or(SearchError::NotConfigured)?;
        let Some(indexer) = config.indexer.as_deref() else {
            return Ok(IndexerTrigger::Skipped);
        };

        let response = self
            .client
            .post(Self::indexer_url(config, indexer))
            .header("api-key", config.api_key())
            .header("Content-Length", "0")
            .send()
            .await
            .map_err(|e| SearchError::network(e.to_string()))?;

        Self::handle_response_status(response).await?;
        Ok(IndexerTrigger::Accepted)
    }
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    search: &'a str,
    top: usize,
    select: &'a str,
    #[serde(rename = "queryType", skip_serializing_if = "Option::is_none")]
    query_type: Option<&'a str>,
    #[serde(
        rename = "semanticConfiguration",
        skip_serializing_if = "Option::is_none"
    )]
    semantic_configuration: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AzureSearchConfig {
        AzureSearchConfig::new("https://svc.search.windows.net/", "key", "documents-index")
    }

    #[test]
    fn search_url_targets_index() {
        assert_eq!(
            AzureSearchClient::search_url(&config()),
            "https://svc.search.windows.net/indexes/documents-index/docs/search?api-version=2023-11-01"
        );
    }

    #[test]
    fn indexer_url_targets_indexer_run() {
        assert_eq!(
            AzureSearchClient::indexer_url(&config(), "documents-indexer"),
            "https://svc.search.windows.net/indexers/documents-indexer/run?api-version=2023-11-01"
        );
    }

    #[test]
    fn filename_filter_is_exact_match() {
        assert_eq!(
            AzureSearchClient::filename_filter("resume.pdf"),
            "metadata_storage_name eq 'resume.pdf'"
        );
    }

    #[test]
    fn filename_filter_escapes_single_quotes() {
        assert_eq!(
            AzureSearchClient::filename_filter("john's cv.pdf"),
            "metadata_storage_name eq 'john''s cv.pdf'"
        );
    }

    #[test]
    fn semantic_support_follows_configuration() {
        let without = AzureSearchClient::new(config());
        assert!(!without.supports_semantic());

        let with = AzureSearchClient::new(config().with_semantic_configuration("default"));
        assert!(with.supports_semantic());

        let unconfigured = AzureSearchClient::from_settings(&SearchConfig::default());
        assert!(!unconfigured.supports_semantic());
    }

    #[tokio::test]
    async fn unconfigured_client_fails_fast() {
        let client = AzureSearchClient::from_settings(&SearchConfig::default());

        assert!(matches!(
            client.lexical_query("q", 5, None).await.unwrap_err(),
            SearchError::NotConfigured
        ));
        assert!(matches!(
            client.trigger_indexer().await.unwrap_err(),
            SearchError::NotConfigured
        ));
    }

    #[tokio::test]
    async fn trigger_without_indexer_is_skipped() {
        let client = AzureSearchClient::new(config());
        assert_eq!(
            client.trigger_indexer().await.unwrap(),
            IndexerTrigger::Skipped
        );
    }

    #[test]
    fn semantic_request_serializes_ranking_fields() {
        let body = SearchRequest {
            search: "what is the role",
            top: 5,
            select: CONTENT_FIELD,
            query_type: Some("semantic"),
            semantic_configuration: Some("default"),
            filter: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"queryType\":\"semantic\""));
        assert!(json.contains("\"semanticConfiguration\":\"default\""));
        assert!(!json.contains("filter"));
    }

    #[test]
    fn lexical_request_omits_ranking_fields() {
        let body = SearchRequest {
            search: "what is the role",
            top: 5,
            select: CONTENT_FIELD,
            query_type: None,
            semantic_configuration: None,
            filter: Some(AzureSearchClient::filename_filter("resume.pdf")),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("queryType"));
        assert!(json.contains("\"filter\":\"metadata_storage_name eq 'resume.pdf'\""));
    }

    #[test]
    fn response_parsing_skips_hits_without_content() {
        let body = r#"{"value":[{"content":"first"},{"other":1},{"content":""},{"content":"second"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let passages: Vec<String> = parsed
            .value
            .into_iter()
            .filter_map(|hit| hit.content)
            .filter(|content| !content.is_empty())
            .collect();
        assert_eq!(passages, vec!["first".to_string(), "second".to_string()]);
    }
}
