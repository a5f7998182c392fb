//! JWT token validation
//!
//! Tokens are issued by the FamilyFlow auth service; this crate only needs to
//! validate them and read the caller's user id. Token generation is kept for
//! tooling and tests.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// JWT claims carried by FamilyFlow access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// JWT manager for token operations
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_hours: i64,
}

impl JwtManager {
    pub fn new(secret: &str, access_token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry_hours,
        }
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user_id: &str) -> Result<String, JwtError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + Duration::hours(self.access_token_expiry_hours);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };

        // Explicit algorithm prevents algorithm confusion attacks
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Validate an access token and return its claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.sub.is_empty() {
            return Err(JwtError::Invalid("empty subject".to_string()));
        }

        Ok(data.claims)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    Encoding(String),
    #[error("Token expired")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-jwt-secret-must-be-at-least-32-characters-long";

    #[test]
    fn test_generate_and_validate() {
        let manager = JwtManager::new(SECRET, 1);
        let token = manager.generate_access_token("user-42").unwrap();

        let claims = manager.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, "user-42");
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let issuer = JwtManager::new("another-secret-that-is-also-32-characters", 1);
        let token = issuer.generate_access_token("user-42").unwrap();

        let manager = JwtManager::new(SECRET, 1);
        assert!(matches!(
            manager.validate_access_token(&token),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let manager = JwtManager::new(SECRET, -2);
        let token = manager.generate_access_token("user-42").unwrap();

        assert!(matches!(
            manager.validate_access_token(&token),
            Err(JwtError::Expired)
        ));
    }
}
