//! Azure OpenAI Provider - chat completions against a deployment endpoint.
//!
//! Speaks the deployment-addressed REST route with `api-key` header auth.
//! Completion calls are attempted exactly once: the reply is the primary
//! deliverable of a request and the upstream gives no idempotency guarantee,
//! so failures propagate instead of retrying.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AzureOpenAiConfig::new(endpoint, api_key, "gpt-4o")
//!     .with_temperature(0.2)
//!     .with_max_tokens(800);
//!
//! let provider = AzureOpenAiProvider::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::CompletionConfig;
use crate::ports::{CompletionError, CompletionProvider, Message};

/// Configuration for the Azure OpenAI provider.
#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint (e.g. `https://myresource.openai.azure.com`).
    pub endpoint: String,
    /// API key for authentication.
    api_key: Secret<String>,
    /// Deployment name addressed by the chat-completions route.
    pub deployment: String,
    /// REST API version.
    pub api_version: String,
    /// Sampling temperature sent with every request.
    pub temperature: f32,
    /// Output-length cap sent with every request.
    pub max_tokens: u32,
    /// Request timeout.
    pub timeout: Duration,
}

impl AzureOpenAiConfig {
    /// Creates a new configuration.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: Secret::new(api_key.into()),
            deployment: deployment.into(),
            api_version: "2024-02-01".to_string(),
            temperature: 0.2,
            max_tokens: 800,
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the output-length cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Azure OpenAI chat-completion provider.
///
/// Built unconfigured when required keys are absent; every call then fails
/// with `NotConfigured`, which is how missing configuration surfaces at
/// request time rather than at startup.
pub struct AzureOpenAiProvider {
    config: Option<AzureOpenAiConfig>,
    client: Client,
}

impl AzureOpenAiProvider {
    /// Creates a provider with the given configuration.
    pub fn new(config: AzureOpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config: Some(config),
            client,
        }
    }

    /// Builds a provider from the typed settings section, unconfigured when
    /// any required key is absent.
    pub fn from_settings(settings: &CompletionConfig) -> Self {
        match (&settings.endpoint, &settings.api_key, &settings.deployment) {
            (Some(endpoint), Some(api_key), Some(deployment)) if settings.is_configured() => {
                let config = AzureOpenAiConfig::new(endpoint, api_key, deployment)
                    .with_api_version(settings.api_version.clone())
                    .with_temperature(settings.temperature)
                    .with_max_tokens(settings.max_tokens)
                    .with_timeout(settings.timeout());
                Self::new(config)
            }
            _ => Self {
                config: None,
                client: Client::new(),
            },
        }
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(config: &AzureOpenAiConfig) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            config.endpoint, config.deployment, config.api_version
        )
    }

    /// Parses the API response status and maps errors.
    async fn handle_response_status(response: Response) -> Result<Response, CompletionError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok());
        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(CompletionError::AuthenticationFailed),
            429 => Err(CompletionError::rate_limited(retry_after.unwrap_or(30))),
            code => Err(CompletionError::upstream(code, error_body)),
        }
    }
}

#[async_trait]
impl CompletionProvider for AzureOpenAiProvider {
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError> {
        let config = self.config.as_ref().ok_or(CompletionError::NotConfigured)?;

        let request = ChatCompletionsRequest {
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        let response = self
            .client
            .post(Self::completions_url(config))
            .header("api-key", config.api_key())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout {
                        timeout_secs: config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    CompletionError::network(format!("Connection failed: {}", e))
                } else {
                    CompletionError::network(e.to_string())
                }
            })?;

        let response = Self::handle_response_status(response).await?;

        let completion: ChatCompletionsResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::parse("No choices in response"))?;

        choice
            .message
            .content
            .ok_or_else(|| CompletionError::parse("Choice has no content"))
    }
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
