//! Application state

use axum::extract::FromRef;
use blog_auth::{AuthService, SessionManager};
use blog_db::UserStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub auth: Arc<AuthService>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, auth: Arc<AuthService>) -> Self {
        let sessions = auth.sessions().clone();
        Self {
            users,
            auth,
            sessions,
        }
    }
}

impl FromRef<AppState> for Arc<SessionManager> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
