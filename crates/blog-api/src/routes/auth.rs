//! Registration, login, refresh and logout routes

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use blog_auth::{AuthResponse, LogoutAck};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginRequest, RefreshRequest, RegisterRequest};

// ==================== Input Validation ====================

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

/// Unwrap a JSON body, reporting any parse failure uniformly
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| {
            debug!("Rejected request body: {}", e);
            ApiError::BadRequest("Invalid request body".to_string())
        })
}

/// Validate username format and length
fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::BadRequest(
            "Username can only contain alphanumeric characters, underscores, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate password length
fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== Auth Routes ====================

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let request = json_body(payload)?;
    let email = request.email.trim();
    let username = request.username.trim();

    if email.is_empty() || username.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email, username, and password are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Email address is invalid".to_string()));
    }
    validate_username(username)?;
    validate_password(&request.password)?;

    let response = state.auth.register(email, username, &request.password).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let request = json_body(payload)?;
    let email = request.email.trim();

    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }

    let response = state.auth.login(email, &request.password).await?;
    Ok(Json(response))
}

/// POST /api/auth/refresh
async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let request = json_body(payload)?;
    let token = request.refresh_token.trim();

    if token.is_empty() {
        return Err(ApiError::BadRequest("Refresh token is required".to_string()));
    }

    let response = state.auth.refresh(token).await?;
    Ok(Json(response))
}

/// POST /api/auth/logout
async fn logout(State(state): State<AppState>) -> Json<LogoutAck> {
    Json(state.auth.logout())
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
}
