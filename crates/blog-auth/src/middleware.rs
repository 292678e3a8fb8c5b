//! Authentication middleware for Axum
//!
//! The gate has two stages. [`authenticate`] turns an `Authorization:
//! Bearer` header into an [`AuthUser`]; [`authorize`] checks that user's role
//! against an allow-list. The middleware functions wrap those stages and
//! pass the user between them through request extensions. The decoded
//! [`Claims`] are stored there as well for handlers that need the token's
//! timing or ID.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use blog_db::UserRole;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;
use crate::jwt::Claims;
use crate::session::SessionManager;

/// Roles allowed through admin-only routes
pub const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];
/// Every role
pub const ANY_ROLE: &[UserRole] = &[UserRole::User, UserRole::Admin];

/// Authenticated user information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    /// Create from JWT claims
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        Ok(Self {
            id: claims.subject_id().ok_or(AuthError::InvalidToken)?,
            username: claims.username.clone(),
            email: claims.email.clone(),
            role: claims.role,
        })
    }
}

/// Extract bearer token from authorization header
fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Validate the bearer token carried in the headers
fn bearer_claims(headers: &HeaderMap, sessions: &SessionManager) -> Result<Claims, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = extract_bearer_token(header)?;
    sessions.validate(token)
}

/// Authenticate a request from its headers
pub fn authenticate(headers: &HeaderMap, sessions: &SessionManager) -> Result<AuthUser, AuthError> {
    AuthUser::from_claims(&bearer_claims(headers, sessions)?)
}

/// Check an authenticated user against the allowed roles
///
/// A missing user means no authentication stage ran before this one.
pub fn authorize<'a>(
    user: Option<&'a AuthUser>,
    allowed: &[UserRole],
) -> Result<&'a AuthUser, AuthError> {
    let user = user.ok_or(AuthError::MissingClaims)?;
    if !allowed.contains(&user.role) {
        return Err(AuthError::InsufficientPermissions);
    }
    Ok(user)
}

/// Authentication middleware
///
/// Rejects the request unless it carries a valid bearer token, and adds the
/// AuthUser and its Claims to request extensions for later stages.
pub async fn auth_middleware(
    State(sessions): State<Arc<SessionManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = bearer_claims(request.headers(), &sessions)?;
    let user = AuthUser::from_claims(&claims)?;

    debug!("Authenticated user: {} ({})", user.username, user.role);

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Middleware requiring one of the given roles
pub async fn require_roles(
    allowed: &'static [UserRole],
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(request.extensions().get::<AuthUser>(), allowed)?;
    Ok(next.run(request).await)
}

/// Middleware to require admin role
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AuthError> {
    require_roles(ADMIN_ONLY, request, next).await
}

/// Middleware to require any signed-in role
pub async fn require_user(request: Request, next: Next) -> Result<Response, AuthError> {
    require_roles(ANY_ROLE, request, next).await
}
