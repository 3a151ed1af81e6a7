use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Validation and contract errors exposed by `marketsentry-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("asset identity contains invalid character '{ch}' at index {index}")]
    IdentityInvalidChar { ch: char, index: usize },
    #[error("asset identity length {len} exceeds max {max}")]
    IdentityTooLong { len: usize, max: usize },

    #[error("invalid asset type '{value}', expected one of crypto, stock")]
    InvalidAssetType { value: String },
    #[error("invalid condition '{value}', expected one of gt, lt")]
    InvalidCondition { value: String },
    #[error("invalid trigger '{value}', expected one of once, every-time")]
    InvalidTrigger { value: String },
    #[error("invalid channel '{value}', expected one of email, telegram, push")]
    InvalidChannel { value: String },
    #[error("invalid sort order '{value}', expected one of asc, desc")]
    InvalidSortOrder { value: String },

    #[error("page must be at least 1")]
    InvalidPage,
    #[error("page size {value} must be between 1 and {max}")]
    InvalidPageSize { value: u32, max: u32 },

    #[error("timestamp must be RFC3339, e.g. 2026-12-31T00:00:00Z: '{value}'")]
    InvalidTimestamp { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be greater than zero")]
    NonPositiveValue { field: &'static str },
}

/// Classification of failures returned by the API client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The access token expired and could not be refreshed; the session is gone.
    SessionExpired,
    /// The server rejected the credentials outright (hard 401).
    Unauthorized,
    /// The request never produced an HTTP response.
    Transport,
    /// The server answered with a non-success status.
    Rejected,
    NotFound,
    /// The response body did not match the expected shape.
    Decode,
    /// The request was refused before it was sent.
    InvalidRequest,
}

impl ApiErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionExpired => "session_expired",
            Self::Unauthorized => "unauthorized",
            Self::Transport => "transport",
            Self::Rejected => "rejected",
            Self::NotFound => "not_found",
            Self::Decode => "decode",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

/// Fallback shown when the server supplies no message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong, please try again";

/// Structured error surfaced to callers of the API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    status: Option<u16>,
    retryable: bool,
}

impl ApiError {
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::SessionExpired,
            message: message.into(),
            status: None,
            retryable: false,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: message.into(),
            status: Some(401),
            retryable: false,
        }
    }

    pub fn transport(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            message: message.into(),
            status: None,
            retryable,
        }
    }

    /// Non-success response; an empty server message falls back to the generic one.
    pub fn rejected(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| String::from(GENERIC_FAILURE_MESSAGE));
        let kind = if status == 404 {
            ApiErrorKind::NotFound
        } else {
            ApiErrorKind::Rejected
        };

        Self {
            kind,
            message,
            status: Some(status),
            retryable: status >= 500,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            message: message.into(),
            status: None,
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::InvalidRequest,
            message: message.into(),
            status: None,
            retryable: false,
        }
    }

    pub const fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    /// True when the caller has to log in again.
    pub const fn requires_login(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::SessionExpired | ApiErrorKind::Unauthorized
        )
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({status}): {}", self.kind.as_str(), self.message),
            None => write!(f, "{}: {}", self.kind.as_str(), self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

/// Failures reading or writing the persisted token pair.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_without_message_uses_generic_fallback() {
        let error = ApiError::rejected(500, Some(String::from("   ")));

        assert_eq!(error.kind(), ApiErrorKind::Rejected);
        assert_eq!(error.message(), GENERIC_FAILURE_MESSAGE);
        assert!(error.retryable());
    }

    #[test]
    fn rejected_404_is_not_found() {
        let error = ApiError::rejected(404, Some(String::from("asset not found")));

        assert_eq!(error.kind(), ApiErrorKind::NotFound);
        assert_eq!(error.message(), "asset not found");
        assert!(!error.retryable());
    }

    #[test]
    fn session_errors_require_login() {
        assert!(ApiError::session_expired("gone").requires_login());
        assert!(ApiError::unauthorized("nope").requires_login());
        assert!(!ApiError::transport("timeout", true).requires_login());
    }
}
