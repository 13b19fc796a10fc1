use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Closed classification of failures reported by the billing backend.
///
/// Remote responses are mapped into this once, at the adapter boundary.
/// Everything downstream matches on the kind and never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// The backend rejected the payload (bad reading, bad rate, ...).
    Validation,
    /// The record already exists, e.g. the reading was billed before.
    Conflict,
    /// The request never produced a response (connect error, timeout).
    Network,
    /// The backend answered with a 5xx.
    Server,
    Unknown,
}

impl RemoteErrorKind {
    /// Whether resubmitting the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Server | Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::Network => "network",
            Self::Server => "server",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failed call against the billing backend.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} error: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    /// HTTP status, when the backend answered at all.
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Conflict, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Server, message)
    }

    /// Whether this failure is likely transient.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, RemoteErrorKind::Network | RemoteErrorKind::Server)
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Select at least one connection")]
    EmptyBatch,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        AppError::Domain(DomainError::Remote(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(RemoteErrorKind::Network.is_retryable());
        assert!(RemoteErrorKind::Server.is_retryable());
        assert!(RemoteErrorKind::Unknown.is_retryable());
        assert!(!RemoteErrorKind::Validation.is_retryable());
        assert!(!RemoteErrorKind::Conflict.is_retryable());
    }

    #[test]
    fn remote_error_display_includes_kind() {
        let err = RemoteError::conflict("duplicate reading").with_status(409);
        assert_eq!(err.to_string(), "conflict error: duplicate reading");
        assert_eq!(err.status, Some(409));
    }

    #[test]
    fn transient_only_for_network_and_server() {
        assert!(RemoteError::network("timed out").is_transient());
        assert!(RemoteError::server("boom").is_transient());
        assert!(!RemoteError::validation("bad").is_transient());
        assert!(!RemoteError::new(RemoteErrorKind::Unknown, "?").is_transient());
    }

    #[test]
    fn app_error_wraps_remote_failures_as_domain() {
        let err: AppError = RemoteError::server("boom").with_status(503).into();
        assert!(matches!(err, AppError::Domain(DomainError::Remote(ref e)) if e.status == Some(503)));
        assert_eq!(err.to_string(), "server error: boom");
    }

    #[test]
    fn app_error_keeps_config_message() {
        let err: AppError = ConfigError::Invalid("api.timeout_secs must be positive".into()).into();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: api.timeout_secs must be positive"
        );
    }
}
