//! Unified error type for client operations.
//!
//! Every failure surfaces to the caller as one of four kinds: input
//! rejected locally, a non-2xx service response, a transport failure after
//! retries were exhausted, or a 2xx body that could not be parsed. Nothing
//! is recovered or retried at this level; the retry policy lives in the
//! transport layer.

use thiserror::Error;

use crate::client::types::HealthStatus;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KeyServiceError>;

/// Errors surfaced by [`crate::SigningKeyClient`] operations.
#[derive(Debug, Error)]
pub enum KeyServiceError {
    /// Input rejected before any network request was issued: malformed
    /// key id, or an authenticated operation attempted without a token.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Non-2xx response from the service. `code`, `message` and
    /// `request_id` are filled in when the error body was parseable JSON;
    /// otherwise `message` carries the raw body text.
    #[error(
        "API error [{}] (status {status}): {}",
        .code.as_deref().unwrap_or("UNKNOWN"),
        .message.as_deref().unwrap_or("no error body")
    )]
    Remote {
        status: u16,
        code: Option<String>,
        message: Option<String>,
        request_id: Option<String>,
    },

    /// A health probe answered 503: the service is reachable but one of
    /// its checks is failing. Carries the parsed report so callers can
    /// see which check failed.
    #[error(
        "service degraded (key storage: {}, database: {})",
        if .report.checks.key_storage { "ok" } else { "failing" },
        if .report.checks.database { "ok" } else { "failing" }
    )]
    Degraded { report: HealthStatus },

    /// Connection, DNS or timeout failure, reported after the transport
    /// retry budget is spent.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Successful status but a body that does not match the expected
    /// shape.
    #[error("malformed response: {context}")]
    MalformedResponse { context: String },
}

impl KeyServiceError {
    /// True if the service reported the key as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Remote { status, code, .. } => {
                *status == 404 || code.as_deref() == Some("KEY_NOT_FOUND")
            }
            _ => false,
        }
    }

    /// True if the service rejected the credential.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Remote { status, .. } if *status == 401 || *status == 403)
    }

    /// True if a health probe came back with a degraded report.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// True if the service throttled the request and the retry budget ran
    /// out.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Remote { status, .. } if *status == 429)
    }

    /// HTTP status of a remote error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_renders_code_and_message() {
        let err = KeyServiceError::Remote {
            status: 400,
            code: Some("INVALID_KEY_FORMAT".to_string()),
            message: Some("key is not armored".to_string()),
            request_id: None,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("INVALID_KEY_FORMAT"));
        assert!(rendered.contains("status 400"));
        assert!(rendered.contains("key is not armored"));
    }

    #[test]
    fn remote_error_falls_back_when_body_was_unparseable() {
        let err = KeyServiceError::Remote {
            status: 502,
            code: None,
            message: None,
            request_id: None,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("UNKNOWN"));
        assert!(rendered.contains("status 502"));
    }

    #[test]
    fn degraded_error_names_the_failing_checks() {
        use crate::client::types::{HealthChecks, HealthStatus};

        let err = KeyServiceError::Degraded {
            report: HealthStatus {
                status: "degraded".to_string(),
                version: "1.4.2".to_string(),
                timestamp: chrono::Utc::now(),
                checks: HealthChecks {
                    key_storage: true,
                    database: false,
                },
            },
        };
        assert!(err.is_degraded());
        let rendered = err.to_string();
        assert!(rendered.contains("key storage: ok"));
        assert!(rendered.contains("database: failing"));
    }

    #[test]
    fn predicates_match_status_codes() {
        let not_found = KeyServiceError::Remote {
            status: 404,
            code: None,
            message: None,
            request_id: None,
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_auth_error());

        let by_code = KeyServiceError::Remote {
            status: 200,
            code: Some("KEY_NOT_FOUND".to_string()),
            message: None,
            request_id: None,
        };
        assert!(by_code.is_not_found());

        let throttled = KeyServiceError::Remote {
            status: 429,
            code: None,
            message: None,
            request_id: None,
        };
        assert!(throttled.is_rate_limited());

        let invalid = KeyServiceError::InvalidArgument("bad".to_string());
        assert!(!invalid.is_not_found());
        assert_eq!(invalid.status(), None);
    }
}
