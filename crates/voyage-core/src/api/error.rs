use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Coarse classification used to pick a recovery policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response was obtained.
    Transport,
    /// A response arrived with a non-success status other than 401.
    Application,
    /// The presented credential is invalid or expired.
    Authorization,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::Rejected {
                status,
                body: truncated,
            },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Unauthorized => FailureKind::Authorization,
            ApiError::AccessDenied(_)
            | ApiError::NotFound(_)
            | ApiError::ServerError(_)
            | ApiError::Rejected { .. } => FailureKind::Application,
            ApiError::Network(_) | ApiError::Transport(_) | ApiError::InvalidResponse(_) => {
                FailureKind::Transport
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert_eq!(ApiError::from_status(401, "").kind(), FailureKind::Authorization);
        assert_eq!(ApiError::from_status(403, "no").kind(), FailureKind::Application);
        assert_eq!(ApiError::from_status(422, "bad").kind(), FailureKind::Application);
        assert_eq!(ApiError::from_status(503, "down").kind(), FailureKind::Application);
        assert_eq!(
            ApiError::Transport("refused".into()).kind(),
            FailureKind::Transport
        );
    }

    #[test]
    fn test_rejected_keeps_status_and_body() {
        match ApiError::from_status(422, "seat taken") {
            ApiError::Rejected { status, body } => {
                assert_eq!(status, 422);
                assert_eq!(body, "seat taken");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.contains("520 total bytes"));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let body = format!("{}é", "a".repeat(MAX_ERROR_BODY_LENGTH - 1));
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.contains("truncated"));
    }
}
