//! Error types for Warden
//!
//! `WardenError` covers every failure the lock and watch layers can raise.
//! Lock timeouts are not errors; they surface as `Ok(false)`.

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum WardenError {
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// Derived state failed validation after a registry change. Fatal: the
    /// change must not be published.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("path '{path}' is already watched for context '{context}'")]
    AlreadyWatching { path: String, context: String },
}

impl WardenError {
    /// Whether the error signals an inconsistent cluster-wide configuration
    pub fn is_fatal(&self) -> bool {
        matches!(self, WardenError::InvalidConfiguration(_))
    }
}

impl From<serde_json::Error> for WardenError {
    fn from(value: serde_json::Error) -> Self {
        WardenError::Serialization(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WardenError::IllegalArgument("timeout must not be negative".to_string());
        assert_eq!(
            err.to_string(),
            "illegal argument: timeout must not be negative"
        );

        let err = WardenError::AlreadyWatching {
            path: "/demo/state/datasources".to_string(),
            context: "proxy".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "path '/demo/state/datasources' is already watched for context 'proxy'"
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(WardenError::InvalidConfiguration("no replica".to_string()).is_fatal());
        assert!(!WardenError::Repository("offline".to_string()).is_fatal());
        assert!(!WardenError::IllegalArgument("empty".to_string()).is_fatal());
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: WardenError = parse.unwrap_err().into();
        assert!(matches!(err, WardenError::Serialization(_)));
    }
}
