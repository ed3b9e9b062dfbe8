// Request extractors for authenticated routes
//
// Handlers declare the access level they need in their signature: AuthUser
// for any signed-in account, AdminUser / EmployeeUser to gate by role.
// Authorization is decided from token claims alone; no database round trip.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use seatwise_core::{Department, Role};

use super::config::AuthConfig;
use super::jwt::{AccessTokenClaims, JwtService};

/// Error response for authentication and authorization failures.
#[derive(Debug, Serialize)]
pub struct AuthError {
    pub error: String,
    pub code: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl AuthError {
    pub fn unauthorized(message: &str) -> Self {
        Self {
            error: message.to_string(),
            code: "unauthorized".to_string(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    /// Deliberately vague; never discloses whether the account exists.
    pub fn invalid_credentials() -> Self {
        Self {
            error: "Invalid email or password".to_string(),
            code: "invalid_credentials".to_string(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    pub fn forbidden(message: &str) -> Self {
        Self {
            error: message.to_string(),
            code: "forbidden".to_string(),
            status: StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<AuthError> for crate::common::ApiError {
    fn from(err: AuthError) -> Self {
        crate::common::ApiError::new(err.status, &err.code, err.error)
    }
}

/// Shared authentication state; embedded in every route module's state.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            jwt_service: Arc::new(JwtService::new(config.jwt.clone())),
        }
    }
}

/// Extract AuthState out of a composite router state. Lets the same
/// extractors run against every route module's own state type.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AuthState> for AuthState {
    fn from_ref(input: &AuthState) -> Self {
        input.clone()
    }
}

/// The authenticated account, as carried in token claims.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub department: Department,
}

fn auth_user_from_claims(claims: AccessTokenClaims) -> Result<AuthUser, AuthError> {
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AuthError::unauthorized("Invalid user id in token"))?;
    Ok(AuthUser {
        id,
        email: claims.email,
        name: claims.name,
        role: claims.role,
        department: claims.department,
    })
}

async fn extract_auth_user(parts: &mut Parts, state: &AuthState) -> Result<AuthUser, AuthError> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AuthError::unauthorized("Authentication required"))?;
    let header_str = header_value
        .to_str()
        .map_err(|_| AuthError::unauthorized("Invalid authorization header"))?;
    let token = header_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::unauthorized("Authentication required"))?;

    let claims = state.jwt_service.validate_access_token(token).map_err(|e| {
        tracing::debug!("Token validation failed: {}", e);
        AuthError::unauthorized("Invalid or expired token")
    })?;
    auth_user_from_claims(claims)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        extract_auth_user(parts, &auth_state).await
    }
}

/// Extractor that additionally requires the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(AuthError::forbidden("Admin access required"));
        }
        Ok(AdminUser(user))
    }
}

/// Extractor that requires the employee role. Booking routes use this;
/// admins manage events but do not hold seats.
#[derive(Debug, Clone)]
pub struct EmployeeUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for EmployeeUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Employee {
            return Err(AuthError::forbidden("Employee access required"));
        }
        Ok(EmployeeUser(user))
    }
}
