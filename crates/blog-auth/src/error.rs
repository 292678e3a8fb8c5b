//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blog_db::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Authorization header is required")]
    MissingAuthHeader,

    #[error("Invalid authorization format")]
    InvalidAuthHeader,

    #[error("Unauthorized")]
    MissingClaims,

    #[error("Forbidden: insufficient permissions")]
    InsufficientPermissions,

    #[error("Email already exists")]
    EmailConflict,

    #[error("Username already exists")]
    UsernameConflict,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User account is not active")]
    NotActive,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status this error translates to at the API boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::TokenExpired
            | AuthError::InvalidToken
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MissingClaims
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions | AuthError::NotActive => StatusCode::FORBIDDEN,
            AuthError::EmailConflict | AuthError::UsernameConflict => StatusCode::CONFLICT,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Don't leak storage or hashing details to clients
            AuthError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        };

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
