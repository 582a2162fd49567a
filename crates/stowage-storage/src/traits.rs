//! Storage adapter contract
//!
//! This module defines the StorageAdapter trait that every backend implements, the
//! error type shared by all backends, and the URL derivation capability.

use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use stowage_core::{BackendKind, ErrorMetadata, File, LogLevel};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Storage operation errors
///
/// Errors are `Clone` so a failed adapter construction can be remembered and handed
/// out again on every later lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown adapter {0} or missing dependency")]
    UnknownAdapter(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl ErrorMetadata for StorageError {
    fn http_status_code(&self) -> u16 {
        match self {
            StorageError::ConfigError(_) | StorageError::UnknownAdapter(_) => 422,
            StorageError::UploadFailed(_) => 502,
            StorageError::InvalidKey(_) => 400,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            StorageError::ConfigError(_) => "STORAGE_CONFIGURATION_ERROR",
            StorageError::UnknownAdapter(_) => "UNKNOWN_STORAGE_ADAPTER",
            StorageError::UploadFailed(_) => "STORAGE_WRITE_ERROR",
            StorageError::InvalidKey(_) => "INVALID_STORAGE_KEY",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, StorageError::UploadFailed(_))
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            StorageError::ConfigError(_) | StorageError::UnknownAdapter(_) => {
                Some("Ask an administrator to review the upload storage settings")
            }
            StorageError::UploadFailed(_) => Some("Retry the upload"),
            StorageError::InvalidKey(_) => Some("Rename the file and try again"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Operator-facing configuration problems are shown as-is; the host
            // surfaces them as a validation failure.
            StorageError::ConfigError(msg) => msg.clone(),
            StorageError::UnknownAdapter(_) => self.to_string(),
            StorageError::UploadFailed(_) => "The file could not be stored".to_string(),
            StorageError::InvalidKey(_) => "Invalid file name".to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        matches!(self, StorageError::UploadFailed(_))
    }

    fn log_level(&self) -> LogLevel {
        match self {
            StorageError::ConfigError(_) | StorageError::UnknownAdapter(_) => LogLevel::Warn,
            StorageError::UploadFailed(_) => LogLevel::Error,
            StorageError::InvalidKey(_) => LogLevel::Debug,
        }
    }
}

/// Byte source handed to an adapter. Consumed until EOF.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Storage adapter trait
///
/// All backends (local disk, object stores, image hosts) implement this trait so
/// the upload handler can store a file without knowing where it ends up.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// The backend this adapter writes to
    fn kind(&self) -> BackendKind;

    /// Write the reader's bytes and fill in `file.path` and `file.url`.
    ///
    /// Both fields are assigned together once the write and URL derivation have
    /// succeeded. On error the file is left exactly as it was passed in. The write
    /// is attempted once; retrying is the caller's decision.
    async fn store(&self, file: &mut File, reader: ByteStream) -> StorageResult<()>;

    /// Convenience wrapper around [`StorageAdapter::store`] for in-memory data.
    async fn store_bytes(&self, file: &mut File, data: Vec<u8>) -> StorageResult<()> {
        self.store(file, Box::pin(std::io::Cursor::new(data))).await
    }
}

/// Public URL derivation for backends whose URL is a function of the stored path.
///
/// No blanket or default implementation exists; each backend states its own policy.
pub trait GenerateUrl: Send + Sync {
    /// Derive the public URL for `path` from resolved configuration only.
    fn generate_url(&self, path: &str) -> StorageResult<String>;
}

/// `{base}/{path}` with a trailing slash on the base ignored.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Drain a byte stream into memory for backends that upload in a single request.
pub(crate) async fn read_to_bytes(mut reader: ByteStream) -> StorageResult<Bytes> {
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .await
        .map_err(|e| StorageError::UploadFailed(format!("Failed to read from stream: {}", e)))?;
    Ok(Bytes::from(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_trims_base() {
        assert_eq!(
            join_url("https://cdn.example.com/", "abc.png"),
            "https://cdn.example.com/abc.png"
        );
        assert_eq!(
            join_url("https://cdn.example.com", "abc.png"),
            "https://cdn.example.com/abc.png"
        );
    }

    #[test]
    fn test_error_metadata() {
        let err = StorageError::ConfigError("Upyun cloud CDN address is not configured.".into());
        assert_eq!(err.http_status_code(), 422);
        assert!(!err.is_recoverable());
        assert_eq!(
            err.client_message(),
            "Upyun cloud CDN address is not configured."
        );

        let err = StorageError::UploadFailed("connection reset".into());
        assert_eq!(err.error_code(), "STORAGE_WRITE_ERROR");
        assert!(err.is_recoverable());
        assert!(err.is_sensitive());
        assert!(!err.client_message().contains("connection reset"));
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[tokio::test]
    async fn test_read_to_bytes() {
        let reader: ByteStream = Box::pin(std::io::Cursor::new(b"payload".to_vec()));
        let bytes = read_to_bytes(reader).await.unwrap();
        assert_eq!(&bytes[..], b"payload");
    }
}
