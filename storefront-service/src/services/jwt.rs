use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;

/// Issues and validates the bearer tokens handed out at login.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User id
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        let secret = config.secret.expose_secret();
        if secret.is_empty() {
            return Err(anyhow::anyhow!("JWT secret must not be empty"));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_days: config.expiry_days,
        })
    }

    pub fn generate_token(&self, user_id: &str, email: &str) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + Duration::days(self.expiry_days)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))
    }

    pub fn validate_token(
        &self,
        token: &str,
    ) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }

    pub fn expiry_days(&self) -> i64 {
        self.expiry_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn service(secret: &str, expiry_days: i64) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: Secret::new(secret.to_string()),
            expiry_days,
        })
        .unwrap()
    }

    #[test]
    fn round_trips_claims() {
        let jwt = service("a-very-secret-signing-key", 30);
        let token = jwt.generate_token("user-1", "a@example.com").unwrap();
        let claims = jwt.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 3600);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = service("first-secret-key-1234", 30)
            .generate_token("user-1", "a@example.com")
            .unwrap();
        assert!(service("second-secret-key-5678", 30)
            .validate_token(&token)
            .is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let jwt = service("a-very-secret-signing-key", -1);
        let token = jwt.generate_token("user-1", "a@example.com").unwrap();
        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(JwtService::new(&JwtConfig {
            secret: Secret::new(String::new()),
            expiry_days: 30,
        })
        .is_err());
    }
}
