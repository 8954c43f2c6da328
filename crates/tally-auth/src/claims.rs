use base64::Engine as _;
use chrono::{DateTime, Utc};
use tally_core::identity::AuthIdentity;

use crate::error::AuthError;

/// Validated Clerk JWT claims relevant to Medal Tally.
#[derive(Debug, Clone)]
pub struct ClerkClaims {
    /// Clerk user ID (`sub` claim).
    pub user_id: String,
    /// Token expiration time (from `exp` claim).
    pub expires_at: DateTime<Utc>,
}

impl ClerkClaims {
    /// Identity without a role; the role store fills that in.
    #[must_use]
    pub fn to_identity(&self) -> AuthIdentity {
        AuthIdentity {
            user_id: self.user_id.clone(),
            email: None,
            role: None,
        }
    }

    /// Check if the token is expired or expires within `buffer_secs`.
    #[must_use]
    pub fn is_near_expiry(&self, buffer_secs: i64) -> bool {
        let threshold = Utc::now() + chrono::TimeDelta::seconds(buffer_secs);
        self.expires_at <= threshold
    }
}

/// Read the `exp` claim without verifying the signature.
///
/// Only used to reject obviously stale tokens before a JWKS round trip.
///
/// # Errors
///
/// Returns `AuthError::Other` if the JWT is malformed or has no usable `exp`.
pub fn decode_expiry(jwt: &str) -> Result<DateTime<Utc>, AuthError> {
    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::Other("invalid JWT format".into()));
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| AuthError::Other(format!("base64 decode failed: {e}")))?;
    let value: serde_json::Value = serde_json::from_slice(&payload)
        .map_err(|e| AuthError::Other(format!("JSON parse failed: {e}")))?;
    let exp = value["exp"]
        .as_i64()
        .ok_or_else(|| AuthError::Other("missing exp claim".into()))?;
    DateTime::from_timestamp(exp, 0).ok_or_else(|| AuthError::Other("invalid exp timestamp".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn jwt_with_payload(payload: &str) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "{}.{}.{}",
            engine.encode(r#"{"alg":"RS256"}"#),
            engine.encode(payload),
            engine.encode("sig")
        )
    }

    #[test]
    fn identity_has_no_role() {
        let claims = ClerkClaims {
            user_id: "user_2abc".into(),
            expires_at: Utc::now() + chrono::TimeDelta::hours(1),
        };
        let identity = claims.to_identity();
        assert_eq!(identity.user_id, "user_2abc");
        assert!(identity.role.is_none());
    }

    #[test]
    fn near_expiry_window() {
        let soon = ClerkClaims {
            user_id: "u".into(),
            expires_at: Utc::now() + chrono::TimeDelta::seconds(30),
        };
        let later = ClerkClaims {
            user_id: "u".into(),
            expires_at: Utc::now() + chrono::TimeDelta::seconds(120),
        };
        assert!(soon.is_near_expiry(60));
        assert!(!later.is_near_expiry(60));
    }

    #[test]
    fn decodes_exp() {
        let exp = Utc::now().timestamp() + 3600;
        let jwt = jwt_with_payload(&format!(r#"{{"sub":"user_1","exp":{exp}}}"#));
        assert_eq!(decode_expiry(&jwt).unwrap().timestamp(), exp);
    }

    #[test]
    fn rejects_malformed_jwts() {
        assert!(decode_expiry("only.two").is_err());
        assert!(decode_expiry("a.!!!.c").is_err());
        assert!(decode_expiry(&jwt_with_payload(r#"{"sub":"user_1"}"#)).is_err());
    }
}
