use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the core API.
#[derive(Debug, Error)]
pub enum CoreApiError {
    /// The authorization code or access token was refused (400/401).
    #[error("credentials rejected by core API ({status}): {body}")]
    InvalidCode { status: u16, body: String },

    /// 409, e.g. a nickname that is already taken.
    #[error("conflict reported by core API: {0}")]
    Conflict(String),

    /// Any other 4xx.
    #[error("request rejected by core API ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("core API server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("core API unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx whose body does not match the documented shape.
    #[error("invalid core API response: {0}")]
    InvalidResponse(String),
}

impl CoreApiError {
    /// Classify a non-success status and its (already truncated) body.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let code = status.as_u16();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                CoreApiError::InvalidCode { status: code, body }
            }
            StatusCode::CONFLICT => CoreApiError::Conflict(body),
            s if s.is_client_error() => CoreApiError::Rejected { status: code, body },
            _ => CoreApiError::Server { status: code, body },
        }
    }
}

pub type CoreApiResult<T> = Result<T, CoreApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses_by_kind() {
        assert!(matches!(
            CoreApiError::from_status(StatusCode::BAD_REQUEST, "bad code".into()),
            CoreApiError::InvalidCode { status: 400, .. }
        ));
        assert!(matches!(
            CoreApiError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            CoreApiError::InvalidCode { status: 401, .. }
        ));
        assert!(matches!(
            CoreApiError::from_status(StatusCode::CONFLICT, "taken".into()),
            CoreApiError::Conflict(ref body) if body == "taken"
        ));
        assert!(matches!(
            CoreApiError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            CoreApiError::Rejected { status: 429, .. }
        ));
        assert!(matches!(
            CoreApiError::from_status(StatusCode::BAD_GATEWAY, String::new()),
            CoreApiError::Server { status: 502, .. }
        ));
    }
}
