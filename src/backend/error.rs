//! Backend error types

use thiserror::Error;

/// Backend error with classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    /// Human-readable detail supplied by the backend, if any
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    /// The backend answered with a non-success status
    pub fn application(status: u16, detail: Option<String>) -> Self {
        let message = match &detail {
            Some(d) => format!("HTTP {status}: {d}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind: ApiErrorKind::Application { status },
            message,
            detail,
        }
    }

    /// No usable response was received
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, message)
    }

    /// HTTP status for application errors
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            ApiErrorKind::Application { status } => Some(status),
            ApiErrorKind::Transport => None,
        }
    }

    /// Backend detail, ignoring blank strings
    pub fn user_detail(&self) -> Option<&str> {
        self.detail.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Backend returned 4xx/5xx
    Application { status: u16 },
    /// Network failure or malformed response body
    Transport,
}

impl ApiErrorKind {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_error_carries_status_and_detail() {
        let err = ApiError::application(500, Some("role assistant offline".to_string()));
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.user_detail(), Some("role assistant offline"));
        assert_eq!(err.to_string(), "HTTP 500: role assistant offline");
    }

    #[test]
    fn test_blank_detail_is_not_user_facing() {
        let err = ApiError::application(422, Some("   ".to_string()));
        assert_eq!(err.user_detail(), None);
    }

    #[test]
    fn test_transport_has_no_status() {
        let err = ApiError::transport("connection refused");
        assert!(err.kind.is_transport());
        assert_eq!(err.status(), None);
        assert_eq!(err.user_detail(), None);
    }
}
