use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use rand_core::OsRng;
use tower_sessions::Session;

use crate::{error::ApiError, repository::RepositoryState};

/// Session key under which the logged-in user's id is stored.
pub const SESSION_USER_KEY: &str = "user_id";

/// Name of the session cookie issued by the session layer.
pub const SESSION_COOKIE_NAME: &str = "seagro.sid";

/// AuthUser Extractor Result
///
/// The resolved principal of an authenticated request. Handlers take it as an
/// argument instead of looking up a global "current user".
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

/// AuthUser Extractor Implementation
///
/// 1. Loads the `tower-sessions` session attached by the session layer.
/// 2. Reads the user id stored at login.
/// 3. Confirms the user still exists in the database.
///
/// Rejection: `ApiError::Unauthorized` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);

        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::internal(format!("session layer missing: {msg}")))?;

        let user_id = session
            .get::<i64>(SESSION_USER_KEY)
            .await
            .map_err(|e| ApiError::internal(format!("session error: {e}")))?
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        // The account may have disappeared since the session was issued.
        let user = repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}

/// Hash a password using Argon2id with a fresh random salt.
///
/// CPU-heavy; async callers should run it through `tokio::task::spawn_blocking`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("failed to hash password: {e}")))
}

/// Verify a password against a stored PHC hash string. A malformed hash never verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is not a valid PHC string");
            false
        }
    }
}

/// Runs [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("password hashing task failed: {e}")))?
}

/// Runs [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(password: String, password_hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| ApiError::internal(format!("password verification task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_accepts_original_password() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("password123", &hash));
        assert!(!verify_password("password124", &hash));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("secret").unwrap();
        let b = hash_password("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }
}
