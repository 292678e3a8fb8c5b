//! User routes

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State, rejection::JsonRejection},
    http::request::Parts,
    middleware,
    routing::{get, put},
};
use blog_auth::{AuthError, AuthUser, UserProfile, auth_middleware, require_admin, require_user};
use blog_db::{UserRole, UserStore};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{UpdateAvatarRequest, UpdateUserRequest};

/// Maximum allowed avatar URL length
const MAX_AVATAR_URL_LENGTH: usize = 2048;

/// The user placed in request extensions by the authentication stage
pub struct CurrentUser(pub AuthUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Auth(AuthError::MissingClaims))
    }
}

/// GET /api/users/me
async fn me(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .users
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", auth.id)))?;

    Ok(Json(UserProfile::from(&user)))
}

/// Normalise an avatar URL; blank clears the avatar
fn validate_avatar_url(avatar_url: Option<&str>) -> Result<Option<&str>, ApiError> {
    let Some(url) = avatar_url.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    if url.len() > MAX_AVATAR_URL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Avatar URL exceeds maximum length of {} characters",
            MAX_AVATAR_URL_LENGTH
        )));
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ApiError::BadRequest(
            "Avatar URL must be an http(s) URL".to_string(),
        ));
    }
    Ok(Some(url))
}

/// PUT /api/users/me/avatar
async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(auth): CurrentUser,
    payload: Result<Json<UpdateAvatarRequest>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let Json(request) =
        payload.map_err(|_| ApiError::BadRequest("Invalid request body".to_string()))?;
    let avatar_url = validate_avatar_url(request.avatar_url.as_deref())?;

    let user = state
        .users
        .update_avatar_url(auth.id, avatar_url)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", auth.id)))?;

    debug!("User {} set avatar to {:?}", user.username, user.avatar_url);
    Ok(Json(UserProfile::from(&user)))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    Ok(Json(UserProfile::from(&user)))
}

/// PATCH /api/users/{id}
async fn update_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let Json(request) =
        payload.map_err(|_| ApiError::BadRequest("Invalid request body".to_string()))?;

    if request.role.is_none() && request.is_active.is_none() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }
    let role = request
        .role
        .as_deref()
        .map(|r| {
            r.parse::<UserRole>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid role: {}", r)))
        })
        .transpose()?;

    if admin.id == id && (role == Some(UserRole::User) || request.is_active == Some(false)) {
        return Err(ApiError::BadRequest(
            "Cannot demote or deactivate your own account".to_string(),
        ));
    }

    debug!("Admin {} updating user {}", admin.username, id);

    let mut updated = None;
    if let Some(role) = role {
        updated = state.users.update_role(id, role).await?;
        if updated.is_none() {
            return Err(ApiError::NotFound(format!("User: {}", id)));
        }
    }
    if let Some(is_active) = request.is_active {
        updated = state.users.set_active(id, is_active).await?;
    }
    let user = updated.ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    info!(
        "User {} updated by {}: role={}, active={}",
        user.username, admin.username, user.role, user.is_active
    );
    Ok(Json(UserProfile::from(&user)))
}

/// Create user routes
///
/// Every route here sits behind the authentication stage; the role stage
/// differs per route group.
pub fn routes(state: &AppState) -> Router<AppState> {
    let member = Router::new()
        .route("/api/users/me", get(me))
        .route("/api/users/me/avatar", put(update_avatar))
        .route_layer(middleware::from_fn(require_user));

    let admin = Router::new()
        .route("/api/users/{id}", get(get_user).patch(update_user))
        .route_layer(middleware::from_fn(require_admin));

    member.merge(admin).route_layer(middleware::from_fn_with_state(
        state.sessions.clone(),
        auth_middleware,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{TestApp, send, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};

    async fn register(app: &TestApp, email: &str, username: &str) -> Value {
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "username": username, "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    /// Register an account and promote it, returning a fresh admin session
    async fn admin_session(app: &TestApp) -> Value {
        let body = register(app, "root@x.com", "root").await;
        let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
        app.state.users.update_role(id, UserRole::Admin).await.unwrap();

        let (_, session) = send(
            &app.router,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "root@x.com", "password": "password123" })),
        )
        .await;
        session
    }

    fn token(body: &Value) -> &str {
        body["access_token"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_me_requires_bearer_token() {
        let app = test_app().await;

        let (status, body) = send(&app.router, Method::GET, "/api/users/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization header is required");

        let alice = register(&app, "alice@x.com", "alice").await;
        let (status, body) =
            send(&app.router, Method::GET, "/api/users/me", Some(token(&alice)), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "alice@x.com");
        assert_eq!(body["role"], "user");
    }

    #[test]
    fn test_validate_avatar_url() {
        assert_eq!(
            validate_avatar_url(Some(" https://cdn/a.png ")).unwrap(),
            Some("https://cdn/a.png")
        );
        assert_eq!(validate_avatar_url(Some("   ")).unwrap(), None);
        assert_eq!(validate_avatar_url(None).unwrap(), None);
        assert!(validate_avatar_url(Some("javascript:alert(1)")).is_err());
        let long = format!("https://cdn/{}", "a".repeat(MAX_AVATAR_URL_LENGTH));
        assert!(validate_avatar_url(Some(&long)).is_err());
    }

    #[tokio::test]
    async fn test_update_own_avatar() {
        let app = test_app().await;
        let alice = register(&app, "alice@x.com", "alice").await;

        let (status, _) = send(
            &app.router,
            Method::PUT,
            "/api/users/me/avatar",
            None,
            Some(json!({ "avatar_url": "https://cdn/a.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/api/users/me/avatar",
            Some(token(&alice)),
            Some(json!({ "avatar_url": "https://cdn/a.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["avatar_url"], "https://cdn/a.png");

        let (_, me) =
            send(&app.router, Method::GET, "/api/users/me", Some(token(&alice)), None).await;
        assert_eq!(me["avatar_url"], "https://cdn/a.png");

        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/api/users/me/avatar",
            Some(token(&alice)),
            Some(json!({ "avatar_url": "ftp://cdn/a.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Avatar URL must be an http(s) URL");

        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/api/users/me/avatar",
            Some(token(&alice)),
            Some(json!({ "avatar_url": null })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["avatar_url"].is_null());
    }

    #[tokio::test]
    async fn test_refresh_token_accepted_as_bearer() {
        let app = test_app().await;
        let alice = register(&app, "alice@x.com", "alice").await;
        let refresh = alice["refresh_token"].as_str().unwrap();

        let (status, body) =
            send(&app.router, Method::GET, "/api/users/me", Some(refresh), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
    }

    #[tokio::test]
    async fn test_admin_routes_forbid_members() {
        let app = test_app().await;
        let alice = register(&app, "alice@x.com", "alice").await;
        let uri = format!("/api/users/{}", alice["user"]["id"].as_str().unwrap());

        let (status, body) = send(
            &app.router,
            Method::PATCH,
            &uri,
            Some(token(&alice)),
            Some(json!({ "role": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden: insufficient permissions");
    }

    #[tokio::test]
    async fn test_admin_updates_user() {
        let app = test_app().await;
        let admin = admin_session(&app).await;
        let alice = register(&app, "alice@x.com", "alice").await;
        let uri = format!("/api/users/{}", alice["user"]["id"].as_str().unwrap());

        let (status, body) = send(
            &app.router,
            Method::PATCH,
            &uri,
            Some(token(&admin)),
            Some(json!({ "role": "admin", "is_active": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");
        assert_eq!(body["is_active"], false);

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@x.com", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "User account is not active");

        let (status, body) = send(&app.router, Method::GET, &uri, Some(token(&admin)), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
    }

    #[tokio::test]
    async fn test_admin_update_rejections() {
        let app = test_app().await;
        let admin = admin_session(&app).await;
        let own = format!("/api/users/{}", admin["user"]["id"].as_str().unwrap());

        let (status, _) = send(
            &app.router,
            Method::PATCH,
            &own,
            Some(token(&admin)),
            Some(json!({ "is_active": false })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app.router,
            Method::PATCH,
            &own,
            Some(token(&admin)),
            Some(json!({ "role": "superuser" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid role: superuser");

        let (status, _) =
            send(&app.router, Method::PATCH, &own, Some(token(&admin)), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let missing = format!("/api/users/{}", uuid::Uuid::new_v4());
        let (status, _) = send(
            &app.router,
            Method::PATCH,
            &missing,
            Some(token(&admin)),
            Some(json!({ "is_active": true })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
