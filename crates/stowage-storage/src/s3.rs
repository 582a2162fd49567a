use crate::object::{ObjectStoreAdapter, ObjectStoreWriter};
use crate::traits::{join_url, GenerateUrl, StorageError, StorageResult};
use object_store::aws::{AmazonS3Builder, AmazonS3ConfigKey};
use std::sync::Arc;
use stowage_core::config::keys;
use stowage_core::{BackendKind, SettingsSource};

const DEFAULT_REGION: &str = "us-east-1";

/// AWS S3 adapter: object-store writer plus the S3 URL policy
pub type S3Adapter = ObjectStoreAdapter<ObjectStoreWriter, S3Urls>;

/// S3 settings, read once when the adapter is built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible providers
    pub endpoint: Option<String>,
    pub cdn_url: Option<String>,
}

impl S3Config {
    pub fn from_settings(settings: &dyn SettingsSource) -> StorageResult<Self> {
        let bucket = settings.get_non_empty(keys::AWS_S3_BUCKET).ok_or_else(|| {
            StorageError::ConfigError(format!("{} not configured", keys::AWS_S3_BUCKET))
        })?;

        Ok(Self {
            bucket,
            access_key_id: settings.get_non_empty(keys::AWS_S3_KEY),
            secret_access_key: settings.get_non_empty(keys::AWS_S3_SECRET),
            region: settings.get_non_empty(keys::AWS_S3_REGION),
            endpoint: settings.get_non_empty(keys::AWS_S3_ENDPOINT),
            cdn_url: settings.get_non_empty(keys::AWS_S3_CDN),
        })
    }
}

/// Public URLs for S3 objects
///
/// With a CDN configured: `{cdn}/{path}`. Otherwise the virtual-hosted AWS URL
/// `https://{bucket}.s3.{region}.amazonaws.com/{path}`, where a missing region
/// means `us-east-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Urls {
    bucket: String,
    region: Option<String>,
    cdn_url: Option<String>,
}

impl S3Urls {
    pub fn new(bucket: String, region: Option<String>, cdn_url: Option<String>) -> Self {
        Self {
            bucket,
            region: region.filter(|r| !r.trim().is_empty()),
            cdn_url: cdn_url.filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }
}

impl GenerateUrl for S3Urls {
    fn generate_url(&self, path: &str) -> StorageResult<String> {
        match self.cdn_url {
            Some(ref cdn) => Ok(join_url(cdn, path)),
            None => Ok(format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket,
                self.region(),
                path
            )),
        }
    }
}

/// Build the S3 adapter.
///
/// Explicit settings win over the `AWS_*` environment. The region used for URLs is
/// the one the client ends up configured with; if it cannot be read it is treated
/// as unset.
pub fn build(config: S3Config) -> StorageResult<S3Adapter> {
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(config.bucket.clone());

    if let Some(ref region) = config.region {
        builder = builder.with_region(region.clone());
    }
    if let Some(ref key) = config.access_key_id {
        builder = builder.with_access_key_id(key.clone());
    }
    if let Some(ref secret) = config.secret_access_key {
        builder = builder.with_secret_access_key(secret.clone());
    }
    if let Some(ref endpoint) = config.endpoint {
        let allow_http = endpoint.starts_with("http://");
        builder = builder
            .with_endpoint(endpoint.clone())
            .with_allow_http(allow_http);
    }

    let region = builder.get_config_value(&AmazonS3ConfigKey::Region);

    let store = builder
        .build()
        .map_err(|e| StorageError::ConfigError(e.to_string()))?;

    let urls = S3Urls::new(config.bucket.clone(), region, config.cdn_url);

    tracing::info!(
        bucket = %config.bucket,
        region = %urls.region(),
        cdn = urls.cdn_url.is_some(),
        "S3 storage adapter created"
    );

    Ok(ObjectStoreAdapter::new(
        BackendKind::AwsS3,
        ObjectStoreWriter::new(Arc::new(store), config.bucket),
        urls,
    ))
}
