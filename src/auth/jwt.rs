use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::identity::Identity;

/// Claims carried by the backend's access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub role: Option<String>,
}

const AUDIENCE: &str = "authenticated";

/// Verify an access token issued by the auth backend and turn it into the
/// identity it represents.
pub fn verify_access_token(token: &str, jwt_secret: &str) -> AppResult<Identity> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_audience(&[AUDIENCE]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Access token rejected");
        AppError::AuthRequired
    })?;

    let expires_at = Utc
        .timestamp_opt(data.claims.exp, 0)
        .single()
        .ok_or(AppError::AuthRequired)?;

    Ok(Identity {
        user_id: data.claims.sub,
        email: data.claims.email.filter(|e| !e.is_empty()),
        access_token: token.to_string(),
        expires_at,
    })
}

/// Opaque token handed to the browser for its server-side session.
pub fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Compute SHA-256 hash of a raw token string, returned as lowercase hex.
pub fn hash_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
pub fn sign_for_tests(user_id: Uuid, email: &str, ttl_secs: i64, jwt_secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let exp = (Utc::now() + chrono::Duration::seconds(ttl_secs)).timestamp();
    let claims = serde_json::json!({
        "sub": user_id,
        "email": email,
        "exp": exp,
        "aud": AUDIENCE,
        "role": "authenticated",
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-jwt-secret-with-enough-length";

    #[test]
    fn test_valid_token_yields_identity() {
        let user_id = Uuid::new_v4();
        let token = sign_for_tests(user_id, "ada@example.com", 3600, SECRET);

        let identity = verify_access_token(&token, SECRET).unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
        assert_eq!(identity.access_token, token);
        assert!(!identity.is_expired(Utc::now()));
    }

    #[test]
    fn test_wrong_secret_or_expired_is_rejected() {
        let token = sign_for_tests(Uuid::new_v4(), "ada@example.com", 3600, SECRET);
        assert!(matches!(
            verify_access_token(&token, "another-secret"),
            Err(AppError::AuthRequired)
        ));

        let expired = sign_for_tests(Uuid::new_v4(), "ada@example.com", -3600, SECRET);
        assert!(matches!(
            verify_access_token(&expired, SECRET),
            Err(AppError::AuthRequired)
        ));
    }

    #[test]
    fn test_session_tokens_are_random_hex() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_token_deterministic() {
        let h1 = hash_token("session-token");
        assert_eq!(h1, hash_token("session-token"));
        assert_ne!(h1, hash_token("other-token"));
        assert_eq!(h1.len(), 64);
    }
}
