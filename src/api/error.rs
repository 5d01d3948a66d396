// Mapping of library errors onto HTTP responses

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::api::models::ApiResponse;
use crate::core_api::CoreApiError;
use crate::error::DataError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    CoreApi(#[from] CoreApiError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    /// Message safe to show to API consumers.
    fn public_message(&self) -> String {
        match self {
            ApiError::Data(DataError::Query(_)) | ApiError::Data(DataError::Decode { .. }) => {
                "internal error".to_string()
            }
            ApiError::CoreApi(CoreApiError::Network(_))
            | ApiError::CoreApi(CoreApiError::Server { .. })
            | ApiError::CoreApi(CoreApiError::InvalidResponse(_)) => {
                "authentication service unavailable".to_string()
            }
            ApiError::CoreApi(CoreApiError::InvalidCode { .. }) => {
                "invalid authorization".to_string()
            }
            ApiError::CoreApi(CoreApiError::Conflict(_)) => "already registered".to_string(),
            ApiError::CoreApi(CoreApiError::Rejected { .. }) => "request rejected".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Data(DataError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Data(DataError::Ambiguous { .. }) => StatusCode::CONFLICT,
            ApiError::Data(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::CoreApi(CoreApiError::InvalidCode { .. }) => StatusCode::UNAUTHORIZED,
            ApiError::CoreApi(CoreApiError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::CoreApi(CoreApiError::Rejected { .. }) => StatusCode::BAD_REQUEST,
            ApiError::CoreApi(CoreApiError::Network(e)) if e.is_timeout() => {
                StatusCode::GATEWAY_TIMEOUT
            }
            ApiError::CoreApi(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        HttpResponse::build(status).json(ApiResponse::<()>::error(self.public_message()))
    }
}
