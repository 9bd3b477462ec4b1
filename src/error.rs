//! Error types for Cloud Foundry API operations.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code the platform uses for an unknown route.
pub const CODE_NOT_FOUND: i64 = 10000;

/// Error code the platform uses for a missing resource.
pub const CODE_RESOURCE_NOT_FOUND: i64 = 10010;

/// A single structured error returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Numeric error code (e.g. 10010).
    #[serde(default)]
    pub code: i64,
    /// Short error title (e.g. "CF-ResourceNotFound").
    #[serde(default)]
    pub title: String,
    /// Human-readable description.
    #[serde(default)]
    pub detail: String,
}

impl ApiError {
    /// Create an error entry.
    pub fn new(code: i64, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code,
            title: title.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.title, self.code, self.detail)
    }
}

/// The `{"errors": [...]}` body of a failed request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

fn join_errors(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur during Cloud Foundry API operations.
#[derive(Debug, Error)]
pub enum CfError {
    /// Configuration is missing or incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// The token endpoint rejected the grant, or no token could be obtained.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// HTTP transport error (DNS, connect, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The redirect chain was longer than the allowed number of hops.
    #[error("stopped after {max} redirects")]
    TooManyRedirects { max: usize },

    /// The platform answered with a structured error envelope.
    #[error("API error (HTTP {status}): {}", join_errors(.errors))]
    Api { status: u16, errors: Vec<ApiError> },

    /// Non-2xx response whose body is not a structured error envelope.
    #[error("unexpected response {status} {status_text}: {body}")]
    UnexpectedResponse {
        status: u16,
        status_text: String,
        body: String,
    },

    /// An asynchronous operation reached its failed state.
    #[error("{operation} failed: {}", join_errors(.errors))]
    JobFailed {
        operation: String,
        errors: Vec<ApiError>,
    },

    /// Gave up waiting for an asynchronous operation that was still running.
    #[error("timed out after {timeout:?} waiting for {operation}")]
    PollTimeout { operation: String, timeout: Duration },

    /// A safety valve on an otherwise server-driven loop was hit.
    #[error("exceeded maximum of {max} attempts while {operation}")]
    ExceededMaxAttempts { operation: &'static str, max: u32 },

    /// The request body could not be encoded as JSON.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// A success response did not match the expected schema.
    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// A query expected at least one result and got none.
    #[error("expected exactly one result, got none")]
    NoResults,

    /// A query expected exactly one result and got several.
    #[error("expected exactly one result, got {0}")]
    MultipleResults(usize),
}

impl CfError {
    /// HTTP status carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::UnexpectedResponse { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Structured errors carried by this error, if any.
    pub fn api_errors(&self) -> &[ApiError] {
        match self {
            Self::Api { errors, .. } | Self::JobFailed { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Returns true if the platform reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { errors, .. } => errors
                .iter()
                .any(|e| e.code == CODE_NOT_FOUND || e.code == CODE_RESOURCE_NOT_FOUND),
            Self::UnexpectedResponse { status, .. } => *status == 404,
            _ => false,
        }
    }
}

/// Turn a failed response into an error.
///
/// A body that parses as a non-empty error envelope wins over the status
/// code; anything else is reported with the raw body for diagnosis.
pub fn decode_error(status: StatusCode, body: &str) -> CfError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if !envelope.errors.is_empty() {
            return CfError::Api {
                status: status.as_u16(),
                errors: envelope.errors,
            };
        }
    }

    CfError::UnexpectedResponse {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        body: body.to_string(),
    }
}

/// Result type alias for Cloud Foundry operations.
pub type Result<T> = core::result::Result<T, CfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_error_wins() {
        let body = r#"{"errors":[{"code":10000,"title":"CF-NotFound","detail":"Unknown request"}]}"#;
        let err = decode_error(StatusCode::NOT_FOUND, body);

        match &err {
            CfError::Api { status, errors } => {
                assert_eq!(*status, 404);
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].code, 10000);
                assert_eq!(errors[0].title, "CF-NotFound");
                assert_eq!(errors[0].detail, "Unknown request");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert!(err.is_not_found());
    }

    #[test]
    fn test_non_json_body_is_unstructured() {
        let err = decode_error(StatusCode::NOT_FOUND, "<html>nope</html>");

        match &err {
            CfError::UnexpectedResponse {
                status,
                status_text,
                body,
            } => {
                assert_eq!(*status, 404);
                assert_eq!(status_text, "Not Found");
                assert_eq!(body, "<html>nope</html>");
            }
            other => panic!("expected UnexpectedResponse, got {other:?}"),
        }
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_empty_error_list_is_unstructured() {
        let err = decode_error(StatusCode::BAD_GATEWAY, r#"{"errors":[]}"#);
        assert!(matches!(
            err,
            CfError::UnexpectedResponse { status: 502, .. }
        ));
    }

    #[test]
    fn test_api_error_display() {
        let err = CfError::Api {
            status: 422,
            errors: vec![
                ApiError::new(10008, "CF-UnprocessableEntity", "name must be unique"),
                ApiError::new(10008, "CF-UnprocessableEntity", "memory too large"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("HTTP 422"));
        assert!(msg.contains("CF-UnprocessableEntity (10008): name must be unique"));
        assert!(msg.contains("memory too large"));
    }
}
