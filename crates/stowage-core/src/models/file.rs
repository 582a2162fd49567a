//! Uploaded file record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One uploaded file.
///
/// The upload handler creates it with an empty `path` and `url`. The storage
/// adapter that writes the bytes fills both in a single step; persisting the
/// record afterwards is the host's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub uuid: Uuid,
    pub base_name: String,
    pub mime_type: String,
    pub size: u64,
    /// Backend-relative storage key
    pub path: String,
    /// Publicly resolvable URL
    pub url: String,
    /// Classification used by the host for quota and rendering policy
    pub tag: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl File {
    pub fn new(base_name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            base_name: base_name.into(),
            mime_type: mime_type.into(),
            size,
            path: String::new(),
            url: String::new(),
            tag: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn is_stored(&self) -> bool {
        !self.path.is_empty() && !self.url.is_empty()
    }
}
