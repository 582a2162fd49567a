//! Stowage Storage Library
//!
//! This crate provides the storage adapter contract, one adapter per supported
//! backend, and the resolver that picks an adapter for an upload.
//!
//! # Public URLs
//!
//! Every adapter follows the same policy. When the operator configured a CDN or
//! base URL for the backend, the public URL is `{cdn}/{path}`. Otherwise the
//! adapter derives the backend's canonical URL (S3 virtual-hosted URLs, the local
//! assets URL), returns the URL reported by the host (Imgur), or refuses the
//! upload when the backend has no public address without a CDN (Upyun).
//!
//! # Path format
//!
//! Adapters that choose their own paths use `{YYYY-MM-DD}/{unix_seconds}-{micros}-{filename}`,
//! generated in the `keys` module so all backends stay consistent.

pub mod factory;
#[cfg(feature = "storage-imgur")]
pub mod imgur;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod object;
#[cfg(feature = "storage-qiniu")]
pub mod qiniu;
pub mod resolver;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;
#[cfg(feature = "storage-upyun")]
pub mod upyun;

// Re-export commonly used types
pub use factory::create_adapter;
#[cfg(feature = "storage-imgur")]
pub use imgur::ImgurAdapter;
#[cfg(feature = "storage-local")]
pub use local::LocalAdapter;
pub use object::{ObjectStoreAdapter, ObjectWriter, PutMeta};
#[cfg(feature = "storage-qiniu")]
pub use qiniu::QiniuAdapter;
pub use resolver::{AdapterResolver, BindingState};
#[cfg(feature = "storage-s3")]
pub use s3::S3Adapter;
pub use stowage_core::{BackendKind, File};
pub use traits::{ByteStream, GenerateUrl, StorageAdapter, StorageError, StorageResult};
#[cfg(feature = "storage-upyun")]
pub use upyun::UpyunAdapter;
