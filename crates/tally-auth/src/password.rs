//! Argon2id password hashes in PHC string form
//! (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`).

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::AuthError;

const SALT_LEN: usize = 16;

/// Hash a password with a fresh random salt and the default Argon2id
/// parameters.
///
/// # Errors
///
/// Returns `AuthError::Other` if the OS random source is unavailable or
/// hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt = [0_u8; SALT_LEN];
    getrandom::fill(&mut salt).map_err(|e| AuthError::Other(format!("random source: {e}")))?;
    let salt = SaltString::encode_b64(&salt)
        .map_err(|e| AuthError::Other(format!("password salt: {e}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Other(format!("password hash: {e}")))
}

/// Check `password` against a stored PHC hash. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
