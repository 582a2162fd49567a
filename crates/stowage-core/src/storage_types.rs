use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend kinds
///
/// The closed set of backends an adapter binding may name. It's defined in core
/// because bindings come from host settings and the tag is stored next to files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BackendKind {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "aws-s3")]
    AwsS3,
    #[serde(rename = "imgur")]
    Imgur,
    #[serde(rename = "qiniu")]
    Qiniu,
    #[serde(rename = "upyun")]
    Upyun,
}

/// A binding key that names no supported backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown adapter {0} or missing dependency")]
pub struct UnknownBackendError(pub String);

impl BackendKind {
    /// Every supported kind, in dispatch order.
    pub const ALL: [BackendKind; 5] = [
        BackendKind::Local,
        BackendKind::AwsS3,
        BackendKind::Imgur,
        BackendKind::Qiniu,
        BackendKind::Upyun,
    ];

    /// Binding key as it appears in settings.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::AwsS3 => "aws-s3",
            BackendKind::Imgur => "imgur",
            BackendKind::Qiniu => "qiniu",
            BackendKind::Upyun => "upyun",
        }
    }

    /// Resolve an optional binding key.
    ///
    /// An absent or blank key means the operator never chose a backend and gets
    /// `Local`. A key that is present but unrecognized is an error, including
    /// backends whose support was dropped (`ovh-svfs`).
    pub fn from_binding_key(key: Option<&str>) -> Result<Self, UnknownBackendError> {
        match key.map(str::trim) {
            None | Some("") => Ok(BackendKind::Local),
            Some(key) => key.parse(),
        }
    }
}

impl FromStr for BackendKind {
    type Err = UnknownBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(BackendKind::Local),
            "aws-s3" => Ok(BackendKind::AwsS3),
            "imgur" => Ok(BackendKind::Imgur),
            "qiniu" => Ok(BackendKind::Qiniu),
            "upyun" => Ok(BackendKind::Upyun),
            _ => Err(UnknownBackendError(s.to_string())),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_keys() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.as_str().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_absent_key_defaults_to_local() {
        assert_eq!(BackendKind::from_binding_key(None).unwrap(), BackendKind::Local);
        assert_eq!(
            BackendKind::from_binding_key(Some("  ")).unwrap(),
            BackendKind::Local
        );
    }

    #[test]
    fn test_removed_backend_is_unknown() {
        let err = BackendKind::from_binding_key(Some("ovh-svfs")).unwrap_err();
        assert_eq!(err, UnknownBackendError("ovh-svfs".to_string()));
        assert!(err.to_string().contains("ovh-svfs"));
    }

    #[test]
    fn test_serde_uses_binding_keys() {
        let json = serde_json::to_string(&BackendKind::AwsS3).unwrap();
        assert_eq!(json, "\"aws-s3\"");
    }
}
