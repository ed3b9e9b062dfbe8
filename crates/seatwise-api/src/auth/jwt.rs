// JWT access token service
//
// Decision: symmetric HS256 with a single short-lived access token. No
// refresh tokens; the booking SPA just sends users back to the login page
// when the token expires.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use seatwise_core::{Department, Role, User};

use super::config::JwtConfig;

/// Claims carried in an access token. Role and department are embedded so
/// the extractors can authorize without a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub department: Department,
    /// Always "access"; rejects tokens minted for other purposes
    pub token_type: String,
    /// Expiration (unix timestamp)
    pub exp: i64,
    /// Issued at (unix timestamp)
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let lifetime = chrono::Duration::from_std(self.config.access_token_lifetime)
            .context("Token lifetime out of range")?;
        let claims = AccessTokenClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            department: user.department,
            token_type: "access".to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to encode access token")
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let validation = Validation::default();
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .context("Invalid access token")?;
        if data.claims.token_type != "access" {
            bail!("Invalid token type");
        }
        Ok(data.claims)
    }

    pub fn access_token_lifetime_secs(&self) -> i64 {
        self.config.access_token_lifetime.as_secs() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    fn service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig {
            secret: secret.to_string(),
            access_token_lifetime: Duration::from_secs(3600),
        })
    }

    fn test_user() -> User {
        User {
            id: Uuid::now_v7(),
            name: "Dana Tester".to_string(),
            email: "dana@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Employee,
            department: Department::Engineering,
            is_active: true,
            is_first_login: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let svc = service("test-secret");
        let user = test_user();
        let token = svc.generate_access_token(&user).unwrap();
        let claims = svc.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, Role::Employee);
        assert_eq!(claims.department, Department::Engineering);
        assert_eq!(claims.token_type, "access");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service("test-secret");
        let user = test_user();
        // Two hours in the past, well beyond the default 60s leeway
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            department: user.department,
            token_type: "access".to_string(),
            exp: now - 7200,
            iat: now - 10800,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(svc.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let svc = service("test-secret");
        let user = test_user();
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            department: user.department,
            token_type: "refresh".to_string(),
            exp: now + 3600,
            iat: now,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(svc.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = service("secret-a")
            .generate_access_token(&test_user())
            .unwrap();
        assert!(service("secret-b").validate_access_token(&token).is_err());
    }
}
