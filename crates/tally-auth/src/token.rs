//! Opaque bearer tokens for locally issued sessions.

use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

const TOKEN_BYTES: usize = 32;

/// Mint a new random bearer token (32 bytes, base64url without padding).
///
/// # Errors
///
/// Returns `AuthError::Other` if the OS random source is unavailable.
pub fn mint_token() -> Result<String, AuthError> {
    let mut bytes = [0_u8; TOKEN_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| AuthError::Other(format!("random source: {e}")))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// The form a token is stored in. Raw tokens are never persisted.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Extract the token from an `Authorization` header value.
#[must_use]
pub fn bearer_from_header(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn minted_tokens_are_url_safe_and_unique() {
        let a = mint_token().unwrap();
        let b = mint_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn hash_is_stable_hex() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(hash_token("abc").len(), 64);
    }

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_from_header("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_from_header("bearer   tok  "), Some("tok"));
        assert_eq!(bearer_from_header("Basic dXNlcg=="), None);
        assert_eq!(bearer_from_header("Bearer "), None);
        assert_eq!(bearer_from_header("Bearer"), None);
    }
}
