// Authentication configuration loaded from environment variables

use std::time::Duration;

const DEFAULT_TOKEN_LIFETIME_HOURS: u64 = 8;

/// JWT signing configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_lifetime: Duration,
}

/// Admin account seeded at startup so a fresh deployment has a login.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub admin: Option<AdminConfig>,
}

impl AuthConfig {
    /// Load from environment. JWT_SECRET falls back to an insecure default so
    /// local development works out of the box; production must set it.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using insecure development secret");
            "insecure-dev-secret-change-me".to_string()
        });

        let lifetime_hours = std::env::var("JWT_EXPIRATION_HOURS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_HOURS);

        let admin = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminConfig {
                    email,
                    password,
                    name: std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string()),
                })
            }
            _ => None,
        };

        Self {
            jwt: JwtConfig {
                secret,
                access_token_lifetime: Duration::from_secs(lifetime_hours * 60 * 60),
            },
            admin,
        }
    }
}
