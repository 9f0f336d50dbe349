//! Azure Blob Storage Adapter - container-ensure and blob upload.
//!
//! Speaks the Blob REST API with SharedKey Lite request signing
//! (HMAC-SHA256 over the canonicalized request). The account is described
//! by a standard connection string. Container creation is idempotent and
//! retried on transient failures; uploads are attempted exactly once and
//! overwrite any existing blob of the same name.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::StorageConfig;
use crate::ports::{DocumentStore, StorageError};

/// Blob service API version sent with every request.
const API_VERSION: &str = "2021-12-02";

/// Maximum retries for the idempotent container-ensure call.
const MAX_RETRIES: u32 = 2;

/// Configuration for the blob storage adapter.
#[derive(Debug, Clone)]
pub struct AzureBlobConfig {
    /// Account connection string.
    connection_string: Secret<String>,
    /// Container documents are uploaded into.
    pub container: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl AzureBlobConfig {
    /// Creates a new configuration.
    pub fn new(connection_string: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            connection_string: Secret::new(connection_string.into()),
            container: container.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parsed storage account identity.
#[derive(Debug, Clone)]
struct BlobAccount {
    /// Account name used in signing and default endpoints.
    name: String,
    /// Decoded account key for HMAC signing.
    key: Vec<u8>,
    /// Blob service endpoint without trailing slash.
    endpoint: String,
}

/// Azure Blob Storage adapter.
///
/// Built unconfigured when the connection string is absent or unparsable;
/// every call then fails with the stored error, surfacing the configuration
/// problem at request time.
pub struct AzureBlobStore {
    account: Result<BlobAccount, StorageError>,
    container: String,
    client: Client,
}

impl AzureBlobStore {
    /// Creates a store with the given configuration.
    pub fn new(config: AzureBlobConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            account: parse_connection_string(config.connection_string.expose_secret()),
            container: config.container,
            client,
        }
    }

    /// Builds a store from the typed settings section, unconfigured when the
    /// connection string is absent.
    pub fn from_settings(settings: &StorageConfig) -> Self {
        match settings.connection_string.as_ref().filter(|s| !s.is_empty()) {
            Some(connection_string) => Self::new(
                AzureBlobConfig::new(connection_string, settings.container.clone())
                    .with_timeout(settings.timeout()),
            ),
            None => Self {
                account: Err(StorageError::NotConfigured),
                container: settings.container.clone(),
                client: Client::new(),
            },
        }
    }

    fn account(&self) -> Result<&BlobAccount, StorageError> {
        self.account.as_ref().map_err(Clone::clone)
    }

    /// Sends one signed request against the blob service.
    async fn send_signed(
        &self,
        account: &BlobAccount,
        verb: reqwest::Method,
        path: &str,
        query: &str,
        content_type: &str,
        extra_headers: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, StorageError> {
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        let mut ms_headers = BTreeMap::new();
        ms_headers.insert("x-ms-date".to_string(), date);
        ms_headers.insert("x-ms-version".to_string(), API_VERSION.to_string());
        for (name, value) in extra_headers {
            ms_headers.insert(name.to_string(), value.to_string());
        }

        let payload = string_to_sign(account, verb.as_str(), content_type, path, &ms_headers);
        let signature = hmac_sha256_base64(&account.key, &payload);

        let url = format!("{}{}{}", account.endpoint, path, query);
        let mut request = self
            .client
            .request(verb, url)
            .header(
                "Authorization",
                format!("SharedKeyLite {}:{}", account.name, signature),
            );
        for (name, value) in &ms_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !content_type.is_empty() {
            request = request.header("Content-Type", content_type);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::network(e.to_string()))
    }

    fn container_path(&self) -> String {
        format!("/{}", self.container)
    }

    fn blob_path(&self, name: &str) -> String {
        format!("/{}/{}", self.container, percent_encode_segment(name))
    }
}

#[async_trait]
impl DocumentStore for AzureBlobStore {
    async fn ensure_container(&self) -> Result<(), StorageError> {
        let account = self.account()?;
        let path = self.container_path();

        let mut attempt = 0;
        loop {
            let result = self
                .send_signed(
                    account,
                    reqwest::Method::PUT,
                    &path,
                    "?restype=container",
                    "",
                    &[],
                    None,
                )
                .await;

            let err = match result {
                Ok(response) => {
                    let status = response.status();
                    // 409 means the container already exists, which is the
                    // idempotent success case.
                    if status.is_success() || status.as_u16() == 409 {
                        return Ok(());
                    }
                    let detail = response.text().await.unwrap_or_default();
                    StorageError::upstream(status.as_u16(), detail)
                }
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= MAX_RETRIES {
                return Err(err);
            }
            let delay = Duration::from_secs(1 << attempt);
            tracing::debug!(error = %err, attempt, "retrying container ensure");
            sleep(delay).await;
            attempt += 1;
        }
    }

    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let account = self.account()?;
        let path = self.blob_path(name);

        let response = self
            .send_signed(
                account,
                reqwest::Method::PUT,
                &path,
                "",
                content_type,
                &[("x-ms-blob-type", "BlockBlob")],
                Some(bytes),
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(StorageError::upstream(status.as_u16(), detail));
        }

        Ok(format!("{}{}", account.endpoint, path))
    }
}

/// Parses a standard storage connection string.
fn parse_connection_string(connection_string: &str) -> Result<BlobAccount, StorageError> {
    if connection_string.is_empty() {
        return Err(StorageError::NotConfigured);
    }

    let mut pairs = BTreeMap::new();
    for part in connection_string.split(';').filter(|p| !p.is_empty()) {
        let (key, value) = part.split_once('=').ok_or_else(|| {
            StorageError::InvalidConnectionString(format!("malformed segment '{part}'"))
        })?;
        pairs.insert(key.trim().to_string(), value.trim().to_string());
    }

    let name = pairs
        .get("AccountName")
        .cloned()
        .ok_or_else(|| StorageError::InvalidConnectionString("AccountName missing".into()))?;
    let key = pairs
        .get("AccountKey")
        .ok_or_else(|| StorageError::InvalidConnectionString("AccountKey missing".into()))
        .and_then(|k| {
            BASE64.decode(k).map_err(|_| {
                StorageError::InvalidConnectionString("AccountKey is not valid base64".into())
            })
        })?;

    // Explicit BlobEndpoint (used by emulators) wins over the derived one.
    let endpoint = match pairs.get("BlobEndpoint") {
        Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
        None => {
            let protocol = pairs
                .get("DefaultEndpointsProtocol")
                .map(String::as_str)
                .unwrap_or("https");
            let suffix = pairs
                .get("EndpointSuffix")
                .map(String::as_str)
                .unwrap_or("core.windows.net");
            format!("{protocol}://{name}.blob.{suffix}")
        }
    };

    Ok(BlobAccount {
        name,
        key,
        endpoint,
    })
}

/// SharedKey Lite string-to-sign for the blob service.
///
/// Layout: VERB, Content-MD5 (unused), Content-Type, Date (empty because
/// x-ms-date is signed as a canonicalized header), canonicalized x-ms
/// headers, canonicalized resource.
fn string_to_sign(
    account: &BlobAccount,
    verb: &str,
    content_type: &str,
    path: &str,
    ms_headers: &BTreeMap<String, String>,
) -> String {
    let canonicalized_headers: String = ms_headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();
    let canonicalized_resource = format!("/{}{}", account.name, path);

    format!("{verb}\n\n{content_type}\n\n{canonicalized_headers}{canonicalized_resource}")
}

/// Base64-encoded HMAC-SHA256 signature.
fn hmac_sha256_base64(key: &[u8], payload: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key");
    mac.update(payload.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Percent-encodes one path segment, keeping unreserved characters.
fn percent_encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONNECTION: &str = "DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=a2V5bWF0ZXJpYWw=;EndpointSuffix=core.windows.net";

    #[test]
    fn parses_standard_connection_string() {
        let account = parse_connection_string(CONNECTION).unwrap();
        assert_eq!(account.name, "acct");
        assert_eq!(account.key, b"keymaterial");
        assert_eq!(account.endpoint, "https://acct.blob.core.windows.net");
    }

    #[test]
    fn explicit_blob_endpoint_wins() {
        let conn = "AccountName=devstoreaccount1;AccountKey=a2V5;BlobEndpoint=http://127.0.0.1:10000/devstoreaccount1/";
        let account = parse_connection_string(conn).unwrap();
        assert_eq!(
            account.endpoint,
            "http://127.0.0.1:10000/devstoreaccount1"
        );
    }

    #[test]
    fn missing_account_key_is_invalid() {
        let err = parse_connection_string("AccountName=acct").unwrap_err();
        assert!(matches!(err, StorageError::InvalidConnectionString(_)));
    }

    #[test]
    fn bad_base64_key_is_invalid() {
        let err =
            parse_connection_string("AccountName=acct;AccountKey=%%%not-base64%%%").unwrap_err();
        assert!(matches!(err, StorageError::InvalidConnectionString(_)));
    }

    #[test]
    fn empty_connection_string_is_not_configured() {
        assert!(matches!(
            parse_connection_string("").unwrap_err(),
            StorageError::NotConfigured
        ));
    }

    #[test]
    fn string_to_sign_layout_is_stable() {
        let account = parse_connection_string(CONNECTION).unwrap();
        let mut headers = BTreeMap::new();
        headers.insert("x-ms-date".to_string(), "Wed, 01 Jan 2026 00:00:00 GMT".to_string());
        headers.insert("x-ms-version".to_string(), API_VERSION.to_string());
        headers.insert("x-ms-blob-type".to_string(), "BlockBlob".to_string());

        let signed = string_to_sign(
            &account,
            "PUT",
            "application/pdf",
            "/documents/resume.pdf",
            &headers,
        );

        assert_eq!(
            signed,
            "PUT\n\napplication/pdf\n\n\
             x-ms-blob-type:BlockBlob\n\
             x-ms-date:Wed, 01 Jan 2026 00:00:00 GMT\n\
             x-ms-version:2021-12-02\n\
             /acct/documents/resume.pdf"
        );
    }

    #[test]
    fn signature_is_deterministic_base64() {
        let a = hmac_sha256_base64(b"key", "payload");
        let b = hmac_sha256_base64(b"key", "payload");
        assert_eq!(a, b);
        assert!(BASE64.decode(&a).is_ok());
    }

    #[test]
    fn blob_names_are_percent_encoded() {
        assert_eq!(percent_encode_segment("resume.pdf"), "resume.pdf");
        assert_eq!(percent_encode_segment("my resume.pdf"), "my%20resume.pdf");
        assert_eq!(percent_encode_segment("a+b&c.txt"), "a%2Bb%26c.txt");
    }

    #[test]
    fn blob_path_includes_container_and_encoded_name() {
        let store = AzureBlobStore::new(AzureBlobConfig::new(CONNECTION, "documents"));
        assert_eq!(
            store.blob_path("my resume.pdf"),
            "/documents/my%20resume.pdf"
        );
    }

    #[tokio::test]
    async fn unconfigured_store_fails_fast() {
        let store = AzureBlobStore::from_settings(&StorageConfig::default());

        assert!(matches!(
            store.ensure_container().await.unwrap_err(),
            StorageError::NotConfigured
        ));
        assert!(matches!(
            store
                .upload("resume.pdf", b"bytes".to_vec(), "application/pdf")
                .await
                .unwrap_err(),
            StorageError::NotConfigured
        ));
    }
}
