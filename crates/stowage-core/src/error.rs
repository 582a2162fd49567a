//! Error types module
//!
//! This module provides the error metadata contract that storage errors implement
//! so a host can present them without knowing which backend raised them, plus the
//! error type for malformed settings.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for operator mistakes like missing configuration
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_WRITE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Errors raised while reading structured values out of a settings source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Setting {key} is not valid JSON: {message}")]
    InvalidJson { key: String, message: String },

    #[error("Setting {key} has an unexpected shape: {message}")]
    InvalidShape { key: String, message: String },
}
