//! Error types for namespace operations.
//!
//! `InvalidArgument` and `RequestTooLarge` are raised locally, before any
//! request is sent. `RemoteFailure` carries the status and message returned
//! by the API. Transport errors are passed through untouched.

use thiserror::Error;

/// Errors that can occur during namespace operations.
#[derive(Debug, Error)]
pub enum KvError {
    /// Malformed key, option, or value rejected before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Key, value, or metadata larger than the namespace accepts.
    #[error("{what} length {length} exceeds limit of {limit} bytes")]
    RequestTooLarge {
        what: &'static str,
        length: usize,
        limit: usize,
    },

    /// The API answered with a non-success status.
    #[error("remote failure ({status}): {message}")]
    RemoteFailure { status: u16, message: String },

    /// Client configuration is incomplete or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Error from the HTTP transport.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Result type alias for namespace operations.
pub type Result<T> = std::result::Result<T, KvError>;

impl KvError {
    /// Returns true if this error was raised before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            KvError::InvalidArgument(_) | KvError::RequestTooLarge { .. } | KvError::Config(_)
        )
    }

    /// Returns true if repeating the same call might succeed.
    ///
    /// Nothing in this crate retries; this is for callers that do.
    pub fn is_retryable(&self) -> bool {
        match self {
            KvError::RemoteFailure { status, .. } => *status == 429 || *status >= 500,
            KvError::Transport(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for KvError {
    fn from(err: serde_json::Error) -> Self {
        KvError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_too_large_display() {
        let err = KvError::RequestTooLarge {
            what: "key",
            length: 600,
            limit: 512,
        };
        let msg = err.to_string();
        assert!(msg.contains("600"));
        assert!(msg.contains("512"));
        assert!(msg.starts_with("key"));
    }

    #[test]
    fn test_remote_failure_display() {
        let err = KvError::RemoteFailure {
            status: 403,
            message: "Authentication error".to_string(),
        };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("Authentication error"));
    }

    #[test]
    fn test_local_errors() {
        assert!(KvError::InvalidArgument("bad".to_string()).is_local());
        assert!(KvError::Config("missing".to_string()).is_local());
        assert!(KvError::RequestTooLarge {
            what: "value",
            length: 2,
            limit: 1
        }
        .is_local());
        assert!(!KvError::RemoteFailure {
            status: 500,
            message: String::new()
        }
        .is_local());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(KvError::RemoteFailure {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(KvError::RemoteFailure {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(!KvError::RemoteFailure {
            status: 400,
            message: String::new()
        }
        .is_retryable());
        assert!(!KvError::InvalidArgument("test".to_string()).is_retryable());
    }

    #[test]
    fn test_from_serde_json() {
        let err: KvError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, KvError::SerializationError(_)));
    }
}
