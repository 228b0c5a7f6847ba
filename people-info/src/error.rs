//! Error types for people-info
//!
//! Client errors carry their message to the caller. Infrastructure errors are
//! logged in full and answered with a fixed per-operation message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use people_common::Error as CommonError;
use thiserror::Error;
use tower::timeout::error::Elapsed;
use tracing::{error, warn};

use crate::api::response::ErrorBody;
use crate::validation::ValidationError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected input (400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Bad path segment or other malformed request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness conflict (409)
    #[error("{0}")]
    Conflict(String),

    /// Request exceeded the server timeout (408)
    #[error("request timed out")]
    RequestTimeout,

    /// Internal server error (500); details were already logged
    #[error("{public}")]
    Internal { public: &'static str },
}

impl ApiError {
    /// Map a store error, logging infrastructure failures under `operation`
    pub fn store(err: CommonError, operation: &'static str) -> Self {
        match err {
            CommonError::NotFound(msg) => ApiError::NotFound(msg),
            CommonError::AlreadyExists(msg) => ApiError::Conflict(msg),
            CommonError::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => {
                error!(operation, error = %other, "Storage failure");
                ApiError::Internal { public: operation }
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody::new(self.to_string()));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Turn errors raised by the middleware stack into enveloped responses
pub async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        warn!("Request exceeded the server timeout");
        ApiError::RequestTimeout
    } else {
        error!(error = %err, "Middleware failure");
        ApiError::Internal {
            public: "internal server error",
        }
    }
}
