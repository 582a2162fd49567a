//! Qiniu Kodo adapter
//!
//! Kodo exposes an S3-compatible API, so writes go through the same object-store
//! client as S3. Buckets are only publicly reachable through a bound domain, which
//! is why the domain is required up front.

use crate::object::{ObjectStoreAdapter, ObjectStoreWriter};
use crate::traits::{join_url, GenerateUrl, StorageError, StorageResult};
use object_store::aws::AmazonS3Builder;
use std::sync::Arc;
use stowage_core::config::keys;
use stowage_core::{BackendKind, SettingsSource};

const DEFAULT_REGION: &str = "cn-east-1";

pub type QiniuAdapter = ObjectStoreAdapter<ObjectStoreWriter, QiniuUrls>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QiniuConfig {
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    pub domain: String,
}

impl QiniuConfig {
    pub fn from_settings(settings: &dyn SettingsSource) -> StorageResult<Self> {
        let required = |key: &str| {
            settings
                .get_non_empty(key)
                .ok_or_else(|| StorageError::ConfigError(format!("{} not configured", key)))
        };

        Ok(Self {
            access_key: required(keys::QINIU_KEY)?,
            secret_key: required(keys::QINIU_SECRET)?,
            bucket: required(keys::QINIU_BUCKET)?,
            region: settings
                .get_non_empty(keys::QINIU_REGION)
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            domain: required(keys::QINIU_CDN)?,
        })
    }

    fn endpoint(&self) -> String {
        format!("https://s3.{}.qiniucs.com", self.region)
    }
}

/// URLs on the bucket's bound domain. A bare host gets an `http://` scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QiniuUrls {
    base: String,
}

impl QiniuUrls {
    pub fn new(domain: &str) -> Self {
        let domain = domain.trim();
        let base = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("http://{}", domain)
        };
        Self { base }
    }
}

impl GenerateUrl for QiniuUrls {
    fn generate_url(&self, path: &str) -> StorageResult<String> {
        Ok(join_url(&self.base, path))
    }
}

pub fn build(config: QiniuConfig) -> StorageResult<QiniuAdapter> {
    let store = AmazonS3Builder::new()
        .with_bucket_name(config.bucket.clone())
        .with_region(config.region.clone())
        .with_endpoint(config.endpoint())
        .with_access_key_id(config.access_key.clone())
        .with_secret_access_key(config.secret_key.clone())
        .build()
        .map_err(|e| StorageError::ConfigError(e.to_string()))?;

    tracing::info!(
        bucket = %config.bucket,
        region = %config.region,
        "Qiniu storage adapter created"
    );

    Ok(ObjectStoreAdapter::new(
        BackendKind::Qiniu,
        ObjectStoreWriter::new(Arc::new(store), config.bucket),
        QiniuUrls::new(&config.domain),
    ))
}

#[cfg(all(test, feature = "storage-qiniu"))]
mod tests {
    use super::*;
    use crate::traits::StorageAdapter;
    use stowage_core::MemorySettings;

    fn settings() -> MemorySettings {
        MemorySettings::new()
            .with(keys::QINIU_KEY, "ak")
            .with(keys::QINIU_SECRET, "sk")
            .with(keys::QINIU_BUCKET, "assets")
            .with(keys::QINIU_CDN, "img.example.cn")
    }

    #[test]
    fn test_bare_domain_gets_scheme() {
        let urls = QiniuUrls::new("img.example.cn");
        assert_eq!(
            urls.generate_url("a/b.png").unwrap(),
            "http://img.example.cn/a/b.png"
        );

        let urls = QiniuUrls::new("https://img.example.cn/");
        assert_eq!(
            urls.generate_url("a/b.png").unwrap(),
            "https://img.example.cn/a/b.png"
        );
    }

    #[test]
    fn test_config_defaults_region() {
        let config = QiniuConfig::from_settings(&settings()).unwrap();
        assert_eq!(config.region, "cn-east-1");
        assert_eq!(config.endpoint(), "https://s3.cn-east-1.qiniucs.com");
    }

    #[test]
    fn test_domain_is_required() {
        let settings = MemorySettings::new()
            .with(keys::QINIU_KEY, "ak")
            .with(keys::QINIU_SECRET, "sk")
            .with(keys::QINIU_BUCKET, "assets");
        let err = QiniuConfig::from_settings(&settings).unwrap_err();
        assert_eq!(
            err,
            StorageError::ConfigError("qiniuCdn not configured".to_string())
        );
    }

    #[test]
    fn test_build() {
        let adapter = build(QiniuConfig::from_settings(&settings()).unwrap()).unwrap();
        assert_eq!(adapter.kind(), BackendKind::Qiniu);
        assert_eq!(
            adapter.urls().generate_url("x.png").unwrap(),
            "http://img.example.cn/x.png"
        );
    }
}
