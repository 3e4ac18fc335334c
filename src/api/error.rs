use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AccountError, AuthError, FieldErrors};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    /// Per-field validation failures
    FieldErrors(FieldErrors),

    InternalError(String),

    Unauthorized(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::FieldErrors(errors) => write!(f, "Validation error: {}", errors),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::<()>::error(msg)),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("A database error occurred"),
                )
            }
            ApiError::FieldErrors(errors) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::field_errors("Validation failed", errors),
            ),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("An internal error occurred"),
                )
            }
            ApiError::Unauthorized(msg) => {
                let mut response =
                    (StatusCode::UNAUTHORIZED, Json(ApiResponse::<()>::error(msg))).into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    header::HeaderValue::from_static("Bearer"),
                );
                return response;
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(errors) => ApiError::FieldErrors(errors),
            AccountError::NotFound => ApiError::NotFound("Account not found".to_string()),
            AccountError::Database(msg) => ApiError::DatabaseError(msg),
            AccountError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            // Credential exchange failures are client errors on the token endpoint
            AuthError::InvalidCredentials => ApiError::FieldErrors(FieldErrors::single(
                "non_field_errors",
                AuthError::InvalidCredentials.to_string(),
            )),
            AuthError::InvalidToken | AuthError::MissingToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}
