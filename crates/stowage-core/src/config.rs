//! Configuration module
//!
//! Storage adapters never own their configuration. They read it from a host-provided
//! [`SettingsSource`], a read-only key-value view, once when the adapter is built.

use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SettingsError;

/// Setting names understood by the storage adapters.
pub mod keys {
    pub const MIME_TYPES: &str = "mimeTypes";

    pub const LOCAL_PATH: &str = "localPath";
    pub const LOCAL_BASE_URL: &str = "localBaseUrl";

    pub const AWS_S3_KEY: &str = "awsS3Key";
    pub const AWS_S3_SECRET: &str = "awsS3Secret";
    pub const AWS_S3_REGION: &str = "awsS3Region";
    pub const AWS_S3_ENDPOINT: &str = "awsS3Endpoint";
    pub const AWS_S3_BUCKET: &str = "awsS3Bucket";
    pub const AWS_S3_CDN: &str = "awsS3Cdn";

    pub const IMGUR_CLIENT_ID: &str = "imgurClientId";

    pub const QINIU_KEY: &str = "qiniuKey";
    pub const QINIU_SECRET: &str = "qiniuSecret";
    pub const QINIU_BUCKET: &str = "qiniuBucket";
    pub const QINIU_REGION: &str = "qiniuRegion";
    pub const QINIU_CDN: &str = "qiniuCdn";

    pub const UPYUN_BUCKET: &str = "upyunBucket";
    pub const UPYUN_OPERATOR: &str = "upyunOperator";
    pub const UPYUN_PASSWORD: &str = "upyunPassword";
    pub const UPYUN_CDN: &str = "upyunCdn";
}

const ENV_PREFIX: &str = "UPLOAD_";

/// One entry of the MIME type configuration.
///
/// `mime_type` is a regular expression matched against the upload's MIME type.
/// `adapter` is the binding key; `None` means the operator left it unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimeTypeBinding {
    pub mime_type: String,
    #[serde(default)]
    pub adapter: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
}

impl MimeTypeBinding {
    pub fn new(mime_type: impl Into<String>, adapter: Option<&str>) -> Self {
        Self {
            mime_type: mime_type.into(),
            adapter: adapter.map(String::from),
            template: None,
        }
    }
}

/// Bindings used when the host has no `mimeTypes` setting.
pub fn default_mime_type_bindings() -> Vec<MimeTypeBinding> {
    vec![
        MimeTypeBinding {
            mime_type: r"^image\/.*".to_string(),
            adapter: Some("local".to_string()),
            template: Some("image-preview".to_string()),
        },
        MimeTypeBinding {
            mime_type: ".*".to_string(),
            adapter: Some("local".to_string()),
            template: Some("file".to_string()),
        },
    ]
}

/// Read-only key-value configuration supplied by the host application.
pub trait SettingsSource: Send + Sync {
    /// Raw value for `key`, or `None` when unset.
    fn get(&self, key: &str) -> Option<String>;

    /// Value for `key` with blank strings treated as unset.
    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }

    /// Ordered MIME type to adapter mapping.
    ///
    /// The `mimeTypes` setting is a JSON object whose keys are MIME patterns and
    /// whose values are either an adapter key or `{"adapter": .., "template": ..}`.
    fn mime_type_bindings(&self) -> Result<Vec<MimeTypeBinding>, SettingsError> {
        match self.get_non_empty(keys::MIME_TYPES) {
            Some(raw) => parse_mime_type_bindings(&raw),
            None => Ok(default_mime_type_bindings()),
        }
    }
}

fn parse_mime_type_bindings(raw: &str) -> Result<Vec<MimeTypeBinding>, SettingsError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| SettingsError::InvalidJson {
        key: keys::MIME_TYPES.to_string(),
        message: e.to_string(),
    })?;

    let Value::Object(entries) = value else {
        return Err(SettingsError::InvalidShape {
            key: keys::MIME_TYPES.to_string(),
            message: "expected an object keyed by MIME pattern".to_string(),
        });
    };

    entries
        .into_iter()
        .map(|(mime_type, entry)| match entry {
            Value::String(adapter) => Ok(MimeTypeBinding {
                mime_type,
                adapter: Some(adapter),
                template: None,
            }),
            Value::Null => Ok(MimeTypeBinding {
                mime_type,
                adapter: None,
                template: None,
            }),
            Value::Object(fields) => Ok(MimeTypeBinding {
                mime_type,
                adapter: fields
                    .get("adapter")
                    .and_then(Value::as_str)
                    .map(String::from),
                template: fields
                    .get("template")
                    .and_then(Value::as_str)
                    .map(String::from),
            }),
            other => Err(SettingsError::InvalidShape {
                key: keys::MIME_TYPES.to_string(),
                message: format!("entry for {} must be a string or object, got {}", mime_type, other),
            }),
        })
        .collect()
}

/// In-memory settings, mostly for tests and embedding hosts that already hold
/// their configuration in a map.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MemorySettings
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl SettingsSource for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Settings read from the process environment.
///
/// `awsS3Bucket` is looked up as `UPLOAD_AWS_S3_BUCKET`. A `.env` file is loaded
/// on construction when present.
#[derive(Debug, Clone)]
pub struct EnvSettings {
    prefix: String,
}

impl EnvSettings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::with_prefix(ENV_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable name for a setting key.
    pub fn var_name(&self, key: &str) -> String {
        let mut name = self.prefix.clone();
        let mut prev_lower = false;
        for c in key.chars() {
            if c.is_ascii_uppercase() && prev_lower {
                name.push('_');
            }
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            name.push(c.to_ascii_uppercase());
        }
        name
    }
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SettingsSource for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        env::var(self.var_name(key))
            .ok()
            .filter(|value| !value.is_empty())
    }
}
