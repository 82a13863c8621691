use axum::{
    Json,
    extract::{
        multipart::MultipartError,
        rejection::JsonRejection, multipart::MultipartRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use bazaar_types::api::{ErrorBody, ErrorKind};

/// Every failure a handler can return. Rendered as `{type, message}` with
/// the matching status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Storage or internal failure. The cause is logged, never returned.
    #[error("Something wrong with server")]
    System(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::ValidationFailed,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            ApiError::Forbidden(_) => ErrorKind::Forbidden,
            ApiError::Unauthorized(_) => ErrorKind::Unauthorized,
            ApiError::MethodNotAllowed => ErrorKind::MethodNotAllowed,
            ApiError::System(_) => ErrorKind::SystemError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::System(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Malformed JSON bodies are caller errors, rendered like any other.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::Validation(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::System(cause) = &self {
            error!("System error: {:#}", cause);
        }

        let body = ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
