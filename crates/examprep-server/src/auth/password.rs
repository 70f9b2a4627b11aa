use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use examprep_api::ApiError;
use rand::rngs::OsRng;
use tracing::error;

use crate::error::ApiFailure;

/// Argon2id PHC string for `plain`.
pub fn hash_password(plain: &str) -> Result<String, ApiFailure> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("password hashing failed: {e}");
            ApiFailure(ApiError::internal())
        })
}

/// A stored hash that does not parse counts as a mismatch.
#[must_use]
pub fn verify_password(plain: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
