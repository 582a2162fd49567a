//! Imgur image-host adapter
//!
//! Imgur picks the object id and returns the hosted URL itself, so nothing is
//! derived locally.

use crate::traits::{read_to_bytes, ByteStream, StorageAdapter, StorageError, StorageResult};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use stowage_core::config::keys;
use stowage_core::{BackendKind, File, SettingsSource};

pub const DEFAULT_API_BASE: &str = "https://api.imgur.com/3";

#[derive(Clone, PartialEq, Eq)]
pub struct ImgurConfig {
    pub client_id: String,
    pub api_base: String,
}

impl Debug for ImgurConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ImgurConfig")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ImgurConfig {
    pub fn from_settings(settings: &dyn SettingsSource) -> StorageResult<Self> {
        let client_id = settings.get_non_empty(keys::IMGUR_CLIENT_ID).ok_or_else(|| {
            StorageError::ConfigError(format!("{} not configured", keys::IMGUR_CLIENT_ID))
        })?;

        Ok(Self {
            client_id,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadedImage,
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct UploadedImage {
    id: Option<String>,
    link: Option<String>,
}

pub struct ImgurAdapter {
    http_client: reqwest::Client,
    api_base: String,
    client_id: String,
}

impl Debug for ImgurAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ImgurAdapter")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ImgurAdapter {
    pub fn new(config: ImgurConfig) -> StorageResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                StorageError::ConfigError(format!("Failed to create HTTP client for Imgur: {}", e))
            })?;

        tracing::info!(api_base = %config.api_base, "Imgur storage adapter created");

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client_id: config.client_id,
        })
    }

    async fn upload(&self, base_name: &str, data: &[u8]) -> StorageResult<UploadedImage> {
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(data);

        let response = self
            .http_client
            .post(format!("{}/upload", self.api_base))
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .form(&[
                ("image", image_base64.as_str()),
                ("type", "base64"),
                ("name", base_name),
            ])
            .send()
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!("Failed to send request to Imgur API: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StorageError::UploadFailed(format!(
                "Imgur API request failed: {} - {}",
                status, error_text
            )));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to parse Imgur API response: {}", e))
        })?;

        if !body.success {
            return Err(StorageError::UploadFailed(
                "Imgur API reported an unsuccessful upload".to_string(),
            ));
        }

        Ok(body.data)
    }
}

/// Imgur sometimes hands out plain-http links; the public URL is always https.
fn force_https(link: &str) -> String {
    match link.strip_prefix("http:") {
        Some(rest) => format!("https:{}", rest),
        None => link.to_string(),
    }
}

#[async_trait]
impl StorageAdapter for ImgurAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Imgur
    }

    async fn store(&self, file: &mut File, reader: ByteStream) -> StorageResult<()> {
        let data = read_to_bytes(reader).await?;
        let start = std::time::Instant::now();

        let image = self.upload(&file.base_name, &data).await.map_err(|e| {
            tracing::error!(
                error = %e,
                size_bytes = data.len(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Imgur upload failed"
            );
            e
        })?;

        let (id, link) = match (image.id, image.link) {
            (Some(id), Some(link)) if !id.is_empty() && !link.is_empty() => (id, link),
            _ => {
                return Err(StorageError::UploadFailed(
                    "Imgur API response is missing the image id or link".to_string(),
                ))
            }
        };

        tracing::info!(
            id = %id,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Imgur upload successful"
        );

        file.path = id;
        file.url = force_https(&link);

        Ok(())
    }
}
