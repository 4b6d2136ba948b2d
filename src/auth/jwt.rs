//! JWT access token issuance and validation (HS256)

use crate::{config::AppConfig, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token claim set. Self-contained: signature and expiry can be
/// checked without touching the identity store.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Login handle
    pub username: String,

    /// Issued at (unix seconds)
    pub iat: i64,

    /// Expiration (unix seconds)
    pub exp: i64,

    /// Unique token id, tracked by the session registry for revocation
    pub jti: Uuid,
}

/// An encoded token plus the claims it carries, so the caller can
/// register the session without re-decoding
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Token issuer/validator. Holds the derived keys; the signing secret
/// is loaded once at startup and immutable thereafter.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_ttl_secs: u64,
}

impl JwtService {
    /// Create the service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.token_secret.expose_secret();

        // HS256 needs at least 32 bytes of key material
        if secret.len() < 32 {
            return Err(AppError::Config("Token secret too short (min 32 chars)".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_ttl_secs: config.security.access_token_ttl_secs,
        })
    }

    /// Token lifetime in seconds
    pub fn ttl_secs(&self) -> u64 {
        self.access_token_ttl_secs
    }

    /// Issue a signed access token for an authenticated identity.
    /// Every call mints a fresh jti and timestamps, so two tokens for
    /// the same user are never identical.
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.access_token_ttl_secs as i64);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::Internal(format!("Failed to encode access token: {}", e))
        })?;

        Ok(IssuedToken { token, claims })
    }

    /// Parse a raw token and verify signature and expiry. Any failure
    /// collapses to `Unauthorized`; the cause is only logged.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No clock leeway: an expired token is expired
        validation.leeway = 0;

        Ok(decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                AppError::Unauthorized
            })?
            .claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig,
    };
    use secrecy::Secret;

    fn test_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                addr: "127.0.0.1:3000".to_string(),
                graceful_shutdown_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: Secret::new("postgresql://localhost/test".to_string()),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_secs: 30,
                idle_timeout_secs: 600,
                max_lifetime_secs: 1800,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            security: SecurityConfig {
                token_secret: Secret::new("test_secret_key_32_characters_long!".to_string()),
                access_token_ttl_secs: 3600,
                password_min_length: 8,
                password_require_uppercase: true,
                password_require_digit: true,
                password_require_special: false,
                session_prune_interval_secs: 300,
                session_grace_secs: 600,
            },
        }
    }

    #[test]
    fn test_issue_and_decode_round_trip() {
        let service = JwtService::from_config(&test_config()).unwrap();
        let user_id = Uuid::new_v4();

        let issued = service.issue(user_id, "alice").unwrap();
        let claims = service.decode(&issued.token).unwrap();

        // The subject survives the round trip exactly
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.jti, issued.claims.jti);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_issue_twice_produces_distinct_tokens() {
        let service = JwtService::from_config(&test_config()).unwrap();
        let user_id = Uuid::new_v4();

        let first = service.issue(user_id, "alice").unwrap();
        let second = service.issue(user_id, "alice").unwrap();

        assert_ne!(first.token, second.token);
        assert_ne!(first.claims.jti, second.claims.jti);
    }

    #[test]
    fn test_secret_too_short() {
        let mut config = test_config();
        config.security.token_secret = Secret::new("short".to_string());
        assert!(JwtService::from_config(&config).is_err());
    }

    #[test]
    fn test_malformed_token_fails() {
        let service = JwtService::from_config(&test_config()).unwrap();
        assert!(service.decode("not_a_token").is_err());
        assert!(service.decode("").is_err());
    }

    #[test]
    fn test_tampered_token_fails() {
        let service = JwtService::from_config(&test_config()).unwrap();
        let issued = service.issue(Uuid::new_v4(), "alice").unwrap();

        // Flip one character in the signature segment
        let mut tampered = issued.token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert!(service.decode(&tampered).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let service = JwtService::from_config(&test_config()).unwrap();

        let mut other_config = test_config();
        other_config.security.token_secret =
            Secret::new("another_secret_key_32_characters!!".to_string());
        let other = JwtService::from_config(&other_config).unwrap();

        let issued = other.issue(Uuid::new_v4(), "alice").unwrap();
        assert!(service.decode(&issued.token).is_err());
    }

    #[test]
    fn test_expired_token_fails() {
        let service = JwtService::from_config(&test_config()).unwrap();

        // Encode an already-expired claim set with the same key
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "alice".to_string(),
            iat: (now - Duration::seconds(120)).timestamp(),
            exp: (now - Duration::seconds(60)).timestamp(),
            jti: Uuid::new_v4(),
        };
        let secret = "test_secret_key_32_characters_long!";
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert!(service.decode(&token).is_err());
    }
}
