use crate::keys;
use crate::traits::{
    join_url, ByteStream, GenerateUrl, StorageAdapter, StorageError, StorageResult,
};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use stowage_core::{BackendKind, File};
use tokio::fs;

/// Local filesystem adapter
///
/// Files land under a public assets directory and are served by the host from
/// `base_url`.
#[derive(Clone, Debug)]
pub struct LocalAdapter {
    base_path: PathBuf,
    base_url: String,
}

impl LocalAdapter {
    /// Create a new LocalAdapter instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "public/assets/files")
    /// * `base_url` - Base URL the root is served from (e.g., "https://forum.example.com/assets/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalAdapter {
            base_path,
            base_url,
        })
    }

    /// Convert a storage path to a filesystem path under the root.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(storage_key))
    }

    /// Open `path` for writing, failing if something already exists there.
    async fn create_new(path: &Path) -> StorageResult<fs::File> {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            })
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

impl GenerateUrl for LocalAdapter {
    fn generate_url(&self, path: &str) -> StorageResult<String> {
        Ok(join_url(&self.base_url, path))
    }
}

#[async_trait]
impl StorageAdapter for LocalAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn store(&self, file: &mut File, mut reader: ByteStream) -> StorageResult<()> {
        let key = keys::generate_path(&file.base_name, Utc::now());
        let path = self.key_to_path(&key)?;
        let url = self.generate_url(&key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let mut out = Self::create_new(&path).await?;

        let bytes_copied = tokio::io::copy(&mut reader, &mut out).await.map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path.display(),
                "Local storage write failed"
            );
            StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                path.display(),
                e
            ))
        })?;

        out.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        file.path = key;
        file.url = url;

        Ok(())
    }
}
