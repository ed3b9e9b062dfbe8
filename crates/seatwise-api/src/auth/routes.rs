// Authentication routes: login, current profile, password change
//
// Login failures are reported with one vague message regardless of cause
// (unknown email, wrong password, deactivated account), so the endpoint
// cannot be used to probe which accounts exist.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use seatwise_core::{Department, Role, User};
use seatwise_storage::{is_unique_violation, CreateUser, Database, UserRow};

use super::config::AuthConfig;
use super::middleware::{AuthError, AuthState, AuthUser, FromRef};
use super::password;
use crate::common::ApiError;

const MIN_PASSWORD_LEN: usize = 8;

/// State for authentication routes
#[derive(Clone)]
pub struct AuthApiState {
    pub db: Arc<Database>,
    pub auth: AuthState,
}

impl FromRef<AuthApiState> for AuthState {
    fn from_ref(state: &AuthApiState) -> Self {
        state.auth.clone()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Public view of an account; never carries the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department: Department,
    /// True until the account holder replaces the provisioned temp password
    pub is_first_login: bool,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            department: user.department,
            is_first_login: user.is_first_login,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn user_from_row(row: UserRow) -> User {
    User {
        id: row.id,
        name: row.name,
        email: row.email,
        password_hash: row.password_hash,
        role: Role::from(row.role.as_str()),
        department: Department::from(row.department.as_str()),
        is_active: row.is_active,
        is_first_login: row.is_first_login,
        created_at: row.created_at,
    }
}

/// Authenticate with email and password
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AuthApiState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let row = state.db.get_user_by_email(&req.email).await.map_err(|e| {
        tracing::error!("Login lookup failed: {e:#}");
        AuthError::unauthorized("Login failed")
    })?;
    let Some(row) = row else {
        return Err(AuthError::invalid_credentials());
    };
    let user = user_from_row(row);
    if !user.is_active {
        return Err(AuthError::invalid_credentials());
    }

    let verified =
        password::verify_password(&req.password, &user.password_hash).map_err(|e| {
            tracing::error!("Password verification failed: {e:#}");
            AuthError::unauthorized("Login failed")
        })?;
    if !verified {
        return Err(AuthError::invalid_credentials());
    }

    let access_token = state
        .auth
        .jwt_service
        .generate_access_token(&user)
        .map_err(|e| {
            tracing::error!("Token generation failed: {e:#}");
            AuthError::unauthorized("Login failed")
        })?;

    tracing::info!(user_id = %user.id, role = %user.role, "user logged in");
    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth.jwt_service.access_token_lifetime_secs(),
        user: UserProfile::from(user),
    }))
}

/// Current account profile
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses(
        (status = 200, description = "Current profile", body = UserProfile),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AuthApiState>,
    auth: AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    // Re-read the account so is_first_login reflects a password change made
    // after the token was minted
    let row = state.db.get_user(auth.id).await?;
    let Some(row) = row else {
        return Err(AuthError::unauthorized("Account no longer exists").into());
    };
    let user = user_from_row(row);
    if !user.is_active {
        return Err(AuthError::unauthorized("Account is deactivated").into());
    }
    Ok(Json(UserProfile::from(user)))
}

/// Change the account password
#[utoipa::path(
    post,
    path = "/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Rejected password"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn change_password(
    State(state): State<AuthApiState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    if req.new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(
            "password_too_short",
            format!("New password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }

    let row = state.db.get_user(auth.id).await?;
    let Some(row) = row else {
        return Err(AuthError::unauthorized("Account no longer exists").into());
    };
    let user = user_from_row(row);

    let verified = password::verify_password(&req.current_password, &user.password_hash)?;
    if !verified {
        return Err(ApiError::bad_request(
            "current_password_incorrect",
            "Current password is incorrect",
        ));
    }

    let new_hash = password::hash_password(&req.new_password)?;
    // Also clears is_first_login
    state.db.update_user_password(user.id, &new_hash).await?;
    tracing::info!(user_id = %user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// Seed the admin account configured in the environment. A concurrent
/// replica racing on the same email is fine; the unique index makes one
/// insert win and the loser treats it as already seeded.
pub async fn ensure_admin_user(db: &Database, config: &AuthConfig) -> anyhow::Result<()> {
    let Some(admin) = &config.admin else {
        tracing::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin bootstrap");
        return Ok(());
    };

    if db.get_user_by_email(&admin.email).await?.is_some() {
        tracing::debug!(email = %admin.email, "admin account already present");
        return Ok(());
    }

    let password_hash = password::hash_password(&admin.password)?;
    match db
        .create_user(CreateUser {
            name: admin.name.clone(),
            email: admin.email.clone(),
            password_hash,
            role: Role::Admin.to_string(),
            department: Department::All.to_string(),
            is_first_login: false,
        })
        .await
    {
        Ok(row) => {
            tracing::info!(user_id = %row.id, email = %admin.email, "seeded admin account");
            Ok(())
        }
        Err(e) if is_unique_violation(&e) => Ok(()),
        Err(e) => Err(e),
    }
}

pub fn routes(state: AuthApiState) -> Router {
    Router::new()
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/me", get(me))
        .route("/v1/auth/change-password", post(change_password))
        .with_state(state)
}
