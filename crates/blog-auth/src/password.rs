//! Password hashing with Argon2

use argon2::Argon2;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand_core::OsRng;

use crate::error::AuthError;

/// One-way password hashing capability
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing digest
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Check a plaintext password against a stored digest
    fn verify(&self, digest: &str, password: &str) -> Result<bool, AuthError>;
}

/// Argon2id hasher producing PHC strings
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        hash_password(password)
    }

    fn verify(&self, digest: &str, password: &str) -> Result<bool, AuthError> {
        verify_password(password, digest)
    }
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Password hashing error: {}", e)))
}

/// Verify a password against a PHC-formatted hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::Internal(format!("Stored password hash is invalid: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Internal(format!("Password verification error: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher;
        let digest = hasher.hash("password123").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify(&digest, "password123").unwrap());
        assert!(!hasher.verify(&digest, "wrong-password").unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let first = hash_password("password123").unwrap();
        let second = hash_password("password123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_digest_is_an_error() {
        let result = verify_password("password123", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }
}
