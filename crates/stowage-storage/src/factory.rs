//! Dispatch table from backend kind to adapter constructor.
//!
//! Each backend is behind a cargo feature. A kind whose feature is disabled has no
//! constructor and resolves to `UnknownAdapter`, the same as a kind that was never
//! supported. For enabled kinds, missing settings fail with `ConfigError` before
//! any client is built.

use crate::{StorageAdapter, StorageError, StorageResult};
use std::sync::Arc;
use stowage_core::{BackendKind, SettingsSource};

#[cfg(feature = "storage-local")]
const DEFAULT_LOCAL_PATH: &str = "public/assets/files";
#[cfg(feature = "storage-local")]
const DEFAULT_LOCAL_BASE_URL: &str = "/assets/files";

/// Create the adapter for `kind`, reading its configuration from `settings`.
pub async fn create_adapter(
    kind: BackendKind,
    settings: &dyn SettingsSource,
) -> StorageResult<Arc<dyn StorageAdapter>> {
    match kind {
        #[cfg(feature = "storage-local")]
        BackendKind::Local => {
            use stowage_core::config::keys;

            let base_path = settings
                .get_non_empty(keys::LOCAL_PATH)
                .unwrap_or_else(|| DEFAULT_LOCAL_PATH.to_string());
            let base_url = settings
                .get_non_empty(keys::LOCAL_BASE_URL)
                .unwrap_or_else(|| DEFAULT_LOCAL_BASE_URL.to_string());

            let adapter = crate::LocalAdapter::new(base_path, base_url).await?;
            Ok(Arc::new(adapter))
        }

        #[cfg(feature = "storage-s3")]
        BackendKind::AwsS3 => {
            let config = crate::s3::S3Config::from_settings(settings)?;
            Ok(Arc::new(crate::s3::build(config)?))
        }

        #[cfg(feature = "storage-imgur")]
        BackendKind::Imgur => {
            let config = crate::imgur::ImgurConfig::from_settings(settings)?;
            Ok(Arc::new(crate::ImgurAdapter::new(config)?))
        }

        #[cfg(feature = "storage-qiniu")]
        BackendKind::Qiniu => {
            let config = crate::qiniu::QiniuConfig::from_settings(settings)?;
            Ok(Arc::new(crate::qiniu::build(config)?))
        }

        #[cfg(feature = "storage-upyun")]
        BackendKind::Upyun => {
            let config = crate::upyun::UpyunConfig::from_settings(settings)?;
            Ok(Arc::new(crate::upyun::build(config)?))
        }

        #[allow(unreachable_patterns)]
        other => Err(missing_dependency(other)),
    }
}

/// Whether this build carries the client for `kind`.
pub fn is_available(kind: BackendKind) -> bool {
    match kind {
        BackendKind::Local => cfg!(feature = "storage-local"),
        BackendKind::AwsS3 => cfg!(feature = "storage-s3"),
        BackendKind::Imgur => cfg!(feature = "storage-imgur"),
        BackendKind::Qiniu => cfg!(feature = "storage-qiniu"),
        BackendKind::Upyun => cfg!(feature = "storage-upyun"),
    }
}

#[allow(dead_code)]
fn missing_dependency(kind: BackendKind) -> StorageError {
    StorageError::UnknownAdapter(kind.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::config::keys;
    use stowage_core::MemorySettings;

    #[cfg(feature = "storage-local")]
    #[tokio::test]
    async fn test_create_local_adapter() {
        let dir = tempfile::tempdir().unwrap();
        let settings = MemorySettings::new()
            .with(keys::LOCAL_PATH, dir.path().to_string_lossy())
            .with(keys::LOCAL_BASE_URL, "https://forum.example.com/assets/files");

        let adapter = create_adapter(BackendKind::Local, &settings).await.unwrap();
        assert_eq!(adapter.kind(), BackendKind::Local);
    }

    #[cfg(feature = "storage-s3")]
    #[tokio::test]
    async fn test_incomplete_configuration_is_config_error() {
        let err = match create_adapter(BackendKind::AwsS3, &MemorySettings::new()).await {
            Err(e) => e,
            Ok(_) => panic!("expected configuration error"),
        };
        assert!(matches!(err, StorageError::ConfigError(_)));
    }

    #[cfg(not(feature = "storage-s3"))]
    #[tokio::test]
    async fn test_missing_dependency_is_unknown_adapter() {
        let settings = MemorySettings::new().with(keys::AWS_S3_BUCKET, "my-bucket");
        let err = match create_adapter(BackendKind::AwsS3, &settings).await {
            Err(e) => e,
            Ok(_) => panic!("expected unknown adapter"),
        };
        assert_eq!(err, StorageError::UnknownAdapter("aws-s3".to_string()));
    }

    #[test]
    fn test_availability_follows_features() {
        assert_eq!(
            is_available(BackendKind::AwsS3),
            cfg!(feature = "storage-s3")
        );
        assert_eq!(
            is_available(BackendKind::Local),
            cfg!(feature = "storage-local")
        );
    }
}
