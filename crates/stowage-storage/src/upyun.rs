//! Upyun (USS) adapter
//!
//! Objects are written through the Upyun REST API. A USS bucket has no public
//! address of its own; files are only reachable through the CDN domain bound to it.

use crate::object::{ObjectStoreAdapter, ObjectWriter, PutMeta};
use crate::traits::{join_url, GenerateUrl, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use stowage_core::config::keys;
use stowage_core::{BackendKind, SettingsSource};

pub const DEFAULT_API_BASE: &str = "https://v0.api.upyun.com";

const CDN_NOT_CONFIGURED: &str = "Upyun cloud CDN address is not configured.";

pub type UpyunAdapter = ObjectStoreAdapter<UpyunClient, UpyunUrls>;

#[derive(Clone, PartialEq, Eq)]
pub struct UpyunConfig {
    pub bucket: String,
    pub operator: String,
    pub password: String,
    pub cdn_url: Option<String>,
    pub api_base: String,
}

impl Debug for UpyunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UpyunConfig")
            .field("bucket", &self.bucket)
            .field("operator", &self.operator)
            .field("cdn_url", &self.cdn_url)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl UpyunConfig {
    /// The CDN address is optional here; storing without it fails instead.
    pub fn from_settings(settings: &dyn SettingsSource) -> StorageResult<Self> {
        let required = |key: &str| {
            settings
                .get_non_empty(key)
                .ok_or_else(|| StorageError::ConfigError(format!("{} not configured", key)))
        };

        Ok(Self {
            bucket: required(keys::UPYUN_BUCKET)?,
            operator: required(keys::UPYUN_OPERATOR)?,
            password: required(keys::UPYUN_PASSWORD)?,
            cdn_url: settings.get_non_empty(keys::UPYUN_CDN),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }
}

/// CDN-only URL policy: there is no fallback address to derive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpyunUrls {
    cdn_url: Option<String>,
}

impl UpyunUrls {
    pub fn new(cdn_url: Option<String>) -> Self {
        Self {
            cdn_url: cdn_url.filter(|c| !c.trim().is_empty()),
        }
    }
}

impl GenerateUrl for UpyunUrls {
    fn generate_url(&self, path: &str) -> StorageResult<String> {
        match self.cdn_url {
            Some(ref cdn) => Ok(join_url(cdn, path)),
            None => Err(StorageError::ConfigError(CDN_NOT_CONFIGURED.to_string())),
        }
    }
}

/// Minimal Upyun REST client: authenticated PUT of whole objects.
pub struct UpyunClient {
    http_client: reqwest::Client,
    api_base: String,
    bucket: String,
    operator: String,
    password: String,
}

impl Debug for UpyunClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UpyunClient")
            .field("api_base", &self.api_base)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl UpyunClient {
    pub fn new(config: &UpyunConfig) -> StorageResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                StorageError::ConfigError(format!("Failed to create HTTP client for Upyun: {}", e))
            })?;

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            operator: config.operator.clone(),
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl ObjectWriter for UpyunClient {
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<PutMeta> {
        let url = format!("{}/{}/{}", self.api_base, self.bucket, path);

        let response = self
            .http_client
            .put(&url)
            .basic_auth(&self.operator, Some(&self.password))
            .header("Content-Type", content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!("Failed to send request to Upyun: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StorageError::UploadFailed(format!(
                "Upyun API request failed: {} - {}",
                status, error_text
            )));
        }

        Ok(PutMeta {
            path: path.to_string(),
        })
    }

    fn target(&self) -> &str {
        &self.bucket
    }
}

pub fn build(config: UpyunConfig) -> StorageResult<UpyunAdapter> {
    let client = UpyunClient::new(&config)?;

    if config.cdn_url.is_none() {
        tracing::warn!(
            bucket = %config.bucket,
            "Upyun adapter has no CDN address; uploads will be rejected"
        );
    }

    tracing::info!(bucket = %config.bucket, "Upyun storage adapter created");

    Ok(ObjectStoreAdapter::new(
        BackendKind::Upyun,
        client,
        UpyunUrls::new(config.cdn_url),
    ))
}

#[cfg(all(test, feature = "storage-upyun"))]
mod tests {
    use super::*;
    use crate::traits::StorageAdapter;
    use mockito::Matcher;
    use stowage_core::{File, MemorySettings};

    fn config(api_base: String, cdn_url: Option<&str>) -> UpyunConfig {
        UpyunConfig {
            bucket: "forum".to_string(),
            operator: "op".to_string(),
            password: "secret".to_string(),
            cdn_url: cdn_url.map(String::from),
            api_base,
        }
    }

    #[test]
    fn test_no_cdn_is_a_configuration_error() {
        let urls = UpyunUrls::new(None);
        assert_eq!(
            urls.generate_url("abc.png").unwrap_err(),
            StorageError::ConfigError(CDN_NOT_CONFIGURED.to_string())
        );
    }

    #[test]
    fn test_cdn_url() {
        let urls = UpyunUrls::new(Some("https://up.example.com".to_string()));
        assert_eq!(
            urls.generate_url("abc.png").unwrap(),
            "https://up.example.com/abc.png"
        );
    }

    #[test]
    fn test_cdn_is_optional_at_construction() {
        let settings = MemorySettings::new()
            .with(keys::UPYUN_BUCKET, "forum")
            .with(keys::UPYUN_OPERATOR, "op")
            .with(keys::UPYUN_PASSWORD, "secret");
        let config = UpyunConfig::from_settings(&settings).unwrap();
        assert_eq!(config.cdn_url, None);
        assert_eq!(config.api_base, DEFAULT_API_BASE);

        let err = UpyunConfig::from_settings(&MemorySettings::new()).unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_store_without_cdn_never_contacts_upyun() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", Matcher::Any)
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let adapter = build(config(server.url(), None)).unwrap();
        let mut file = File::new("abc.png", "image/png", 3);
        let err = adapter.store_bytes(&mut file, vec![1, 2, 3]).await.unwrap_err();

        assert_eq!(err, StorageError::ConfigError(CDN_NOT_CONFIGURED.to_string()));
        assert!(file.path.is_empty());
        assert!(file.url.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_store_puts_object() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", Matcher::Regex(r"^/forum/\d{4}-\d{2}-\d{2}/.*-abc\.png$".to_string()))
            .match_header("authorization", "Basic b3A6c2VjcmV0")
            .match_header("content-type", "image/png")
            .with_status(200)
            .create_async()
            .await;

        let adapter = build(config(server.url(), Some("https://up.example.com"))).unwrap();
        let mut file = File::new("abc.png", "image/png", 3);
        adapter.store_bytes(&mut file, vec![1, 2, 3]).await.unwrap();

        assert!(file.path.ends_with("-abc.png"));
        assert_eq!(file.url, format!("https://up.example.com/{}", file.path));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_is_upload_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", Matcher::Any)
            .with_status(401)
            .with_body("{\"msg\":\"need date header\"}")
            .create_async()
            .await;

        let adapter = build(config(server.url(), Some("https://up.example.com"))).unwrap();
        let mut file = File::new("abc.png", "image/png", 3);
        let err = adapter.store_bytes(&mut file, vec![1, 2, 3]).await.unwrap_err();

        assert!(matches!(err, StorageError::UploadFailed(ref msg) if msg.contains("401")));
        assert!(!file.is_stored());
    }
}
