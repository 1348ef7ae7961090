use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tasks::{RepositoryError, session::SessionError};
use thiserror::Error;
use utils_core::response::ApiResponse;

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Repository(err) => match err {
                RepositoryError::EmptyTitle => (StatusCode::BAD_REQUEST, "ValidationError"),
                RepositoryError::NoSession => (StatusCode::UNAUTHORIZED, "Unauthorized"),
                RepositoryError::NotFound { .. } => (StatusCode::NOT_FOUND, "NotFound"),
                RepositoryError::Remote(_) => (StatusCode::BAD_GATEWAY, "RemoteStoreError"),
            },
            ApiError::Session(_) => (StatusCode::BAD_REQUEST, "SessionError"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        };

        let error_message = match &self {
            ApiError::Repository(RepositoryError::NoSession) => {
                "Unauthorized. Please sign in again.".to_string()
            }
            ApiError::Repository(RepositoryError::Remote(_)) => {
                "The task store is unavailable. Please try again.".to_string()
            }
            ApiError::BadRequest(msg) => msg.clone(),
            _ => self.to_string(),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
