//! Generic object-store adapter
//!
//! Object-store backends share the same store flow: pick a path, put the bytes
//! through a uniform writer, derive the URL from the path the backend reports.
//! What differs is the writer and the URL policy, both supplied per backend.

use crate::keys;
use crate::traits::{read_to_bytes, ByteStream, GenerateUrl, StorageAdapter, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use stowage_core::{BackendKind, File};

/// Metadata a backend reports back for a completed put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutMeta {
    /// Path the object was stored under, as normalized by the backend
    pub path: String,
}

/// Uniform put operation over an object store.
#[async_trait]
pub trait ObjectWriter: Send + Sync {
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<PutMeta>;

    /// Short label used in logs (bucket name, service name)
    fn target(&self) -> &str;
}

/// A [`StorageAdapter`] over any [`ObjectWriter`] with a backend-specific URL policy.
pub struct ObjectStoreAdapter<W, U> {
    kind: BackendKind,
    writer: W,
    urls: U,
}

impl<W, U> ObjectStoreAdapter<W, U>
where
    W: ObjectWriter,
    U: GenerateUrl,
{
    pub fn new(kind: BackendKind, writer: W, urls: U) -> Self {
        Self { kind, writer, urls }
    }

    pub fn urls(&self) -> &U {
        &self.urls
    }
}

#[async_trait]
impl<W, U> StorageAdapter for ObjectStoreAdapter<W, U>
where
    W: ObjectWriter,
    U: GenerateUrl,
{
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn store(&self, file: &mut File, reader: ByteStream) -> StorageResult<()> {
        let key = keys::generate_path(&file.base_name, Utc::now());

        // A backend without a derivable public URL must not receive the object.
        self.urls.generate_url(&key)?;

        let data = read_to_bytes(reader).await?;
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let meta = self
            .writer
            .put(&key, data, &file.mime_type)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    backend = %self.kind,
                    target = %self.writer.target(),
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object store upload failed"
                );
                e
            })?;

        let url = self.urls.generate_url(&meta.path)?;

        tracing::info!(
            backend = %self.kind,
            target = %self.writer.target(),
            key = %meta.path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store upload successful"
        );

        file.path = meta.path;
        file.url = url;

        Ok(())
    }
}

#[cfg(feature = "object-store")]
pub use self::store_writer::ObjectStoreWriter;

#[cfg(feature = "object-store")]
mod store_writer {
    use super::{ObjectWriter, PutMeta};
    use crate::traits::{StorageError, StorageResult};
    use async_trait::async_trait;
    use bytes::Bytes;
    use object_store::path::Path;
    use object_store::{
        Attribute, Attributes, ObjectStore, PutOptions, PutPayload, Result as ObjectResult,
    };
    use std::sync::Arc;

    /// [`ObjectWriter`] backed by an `object_store` client (S3 and S3-compatible stores).
    #[derive(Clone)]
    pub struct ObjectStoreWriter {
        store: Arc<dyn ObjectStore>,
        target: String,
    }

    impl ObjectStoreWriter {
        pub fn new(store: Arc<dyn ObjectStore>, target: impl Into<String>) -> Self {
            Self {
                store,
                target: target.into(),
            }
        }
    }

    #[async_trait]
    impl ObjectWriter for ObjectStoreWriter {
        async fn put(&self, path: &str, data: Bytes, content_type: &str) -> StorageResult<PutMeta> {
            let location = Path::from(path.to_string());
            let opts = PutOptions {
                attributes: Attributes::from_iter([(
                    Attribute::ContentType,
                    content_type.to_string(),
                )]),
                ..Default::default()
            };

            let result: ObjectResult<_> = self
                .store
                .put_opts(&location, PutPayload::from(data), opts)
                .await;
            result.map_err(|e| StorageError::UploadFailed(e.to_string()))?;

            Ok(PutMeta {
                path: location.to_string(),
            })
        }

        fn target(&self) -> &str {
            &self.target
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{join_url, StorageError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedBase(&'static str);

    impl GenerateUrl for FixedBase {
        fn generate_url(&self, path: &str) -> StorageResult<String> {
            Ok(join_url(self.0, path))
        }
    }

    struct NoPublicUrl;

    impl GenerateUrl for NoPublicUrl {
        fn generate_url(&self, _path: &str) -> StorageResult<String> {
            Err(StorageError::ConfigError("no public URL".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        puts: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ObjectWriter for Arc<RecordingWriter> {
        async fn put(&self, path: &str, _data: Bytes, _content_type: &str) -> StorageResult<PutMeta> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StorageError::UploadFailed("quota exceeded".to_string()));
            }
            Ok(PutMeta {
                path: format!("normalized/{}", path),
            })
        }

        fn target(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_url_uses_path_reported_by_backend() {
        let writer = Arc::new(RecordingWriter::default());
        let adapter = ObjectStoreAdapter::new(
            BackendKind::AwsS3,
            writer.clone(),
            FixedBase("https://cdn.example.com"),
        );

        let mut file = File::new("abc.png", "image/png", 3);
        adapter.store_bytes(&mut file, vec![1, 2, 3]).await.unwrap();

        assert!(file.path.starts_with("normalized/"));
        assert_eq!(file.url, format!("https://cdn.example.com/{}", file.path));
        assert_eq!(writer.puts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_write_failure_leaves_file_untouched() {
        let writer = Arc::new(RecordingWriter {
            fail: true,
            ..Default::default()
        });
        let adapter = ObjectStoreAdapter::new(
            BackendKind::AwsS3,
            writer.clone(),
            FixedBase("https://cdn.example.com"),
        );

        let mut file = File::new("abc.png", "image/png", 3);
        let before = file.clone();
        let err = adapter.store_bytes(&mut file, vec![1, 2, 3]).await.unwrap_err();

        assert!(matches!(err, StorageError::UploadFailed(_)));
        assert_eq!(file, before);
        assert_eq!(writer.puts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_url_policy_blocks_write() {
        let writer = Arc::new(RecordingWriter::default());
        let adapter = ObjectStoreAdapter::new(BackendKind::Upyun, writer.clone(), NoPublicUrl);

        let mut file = File::new("abc.png", "image/png", 3);
        let err = adapter.store_bytes(&mut file, vec![1, 2, 3]).await.unwrap_err();

        assert!(matches!(err, StorageError::ConfigError(_)));
        assert_eq!(writer.puts.load(Ordering::SeqCst), 0);
        assert!(!file.is_stored());
    }

    #[cfg(feature = "object-store")]
    #[tokio::test]
    async fn test_object_store_writer_puts_bytes() {
        use object_store::memory::InMemory;
        use object_store::path::Path;
        use object_store::{Attribute, AttributeValue, GetOptions, ObjectStore};

        let store = Arc::new(InMemory::new());
        let writer = ObjectStoreWriter::new(store.clone(), "memory");

        let meta = writer
            .put("2024-01-01/abc.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert_eq!(meta.path, "2024-01-01/abc.png");

        let result = store
            .get_opts(&Path::from("2024-01-01/abc.png"), GetOptions::default())
            .await
            .unwrap();
        assert_eq!(
            result.attributes.get(&Attribute::ContentType),
            Some(&AttributeValue::from("image/png"))
        );

        let stored = result.bytes().await.unwrap();
        assert_eq!(&stored[..], b"png");
    }
}
