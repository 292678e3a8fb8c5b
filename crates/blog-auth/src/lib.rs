//! Blog Management Authentication and Authorization
//!
//! This crate provides stateless JWT sessions for the blog backend: paired
//! access/refresh tokens signed with two independent secrets, the login and
//! registration flows built on top of them, and role-based request gating
//! for Axum.

pub mod clock;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;
pub mod session;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AuthError;
pub use jwt::{Claims, ISSUER, SigningKey, TokenError};
pub use middleware::{
    ADMIN_ONLY, ANY_ROLE, AuthUser, auth_middleware, authenticate, authorize, require_admin,
    require_roles, require_user,
};
pub use password::{Argon2Hasher, CredentialHasher, hash_password, verify_password};
pub use service::{AuthResponse, AuthService, LogoutAck, UserProfile};
pub use session::{
    MAX_TOKEN_TTL_SECS, RotatedSession, SessionConfig, SessionManager, TokenPair,
};
