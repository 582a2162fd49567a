//! Stowage Core Library
//!
//! This crate provides the domain model, backend tag set, settings contract and
//! error metadata shared by the storage adapters and by host applications.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{EnvSettings, MemorySettings, MimeTypeBinding, SettingsSource};
pub use error::{ErrorMetadata, LogLevel, SettingsError};
pub use models::File;
pub use storage_types::{BackendKind, UnknownBackendError};
