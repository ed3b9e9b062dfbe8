// Employee account administration
//
// Admins provision accounts; employees never self-register. The generated
// temp password is returned to the admin and also emailed to the employee.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use seatwise_core::{Department, Notifier, Role, User};
use seatwise_storage::{is_unique_violation, CreateUser, Database, UserRow};

use crate::auth::password::{generate_temp_password, hash_password};
use crate::auth::{AdminUser, AuthState, FromRef};
use crate::common::{ApiError, ListResponse};

/// State for employee administration routes
#[derive(Clone)]
pub struct EmployeesState {
    pub db: Arc<Database>,
    pub auth: AuthState,
    pub notifier: Arc<dyn Notifier>,
}

impl FromRef<EmployeesState> for AuthState {
    fn from_ref(state: &EmployeesState) -> Self {
        state.auth.clone()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub department: Department,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: Department,
    pub is_active: bool,
    pub is_first_login: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for EmployeeResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            department: user.department,
            is_active: user.is_active,
            is_first_login: user.is_first_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateEmployeeResponse {
    pub employee: EmployeeResponse,
    /// Shown to the admin so onboarding works even when email delivery is off
    pub temp_password: String,
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

/// Provision an employee account
#[utoipa::path(
    post,
    path = "/v1/admin/employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = CreateEmployeeResponse),
        (status = 400, description = "Rejected input"),
        (status = 409, description = "Email already taken"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn create_employee(
    State(state): State<EmployeesState>,
    _admin: AdminUser,
    Json(req): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<CreateEmployeeResponse>), ApiError> {
    let name = req.name.trim();
    let email = req.email.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("validation", "Name must not be empty"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request(
            "validation",
            "A valid email address is required",
        ));
    }

    let temp_password = generate_temp_password();
    let password_hash = hash_password(&temp_password)?;

    let row = match state
        .db
        .create_user(CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            role: Role::Employee.to_string(),
            department: req.department.to_string(),
            is_first_login: true,
        })
        .await
    {
        Ok(row) => row,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict(
                "email_taken",
                "An account with this email already exists",
            ));
        }
        Err(e) => return Err(ApiError::from(e)),
    };

    let user = user_from_row(row);
    tracing::info!(user_id = %user.id, email = %user.email, "employee account created");

    // Welcome email carries the temp password; a failed send is logged and
    // ignored, the admin still gets the password in the response
    if let Err(e) = state.notifier.employee_created(&user, &temp_password).await {
        tracing::warn!(user_id = %user.id, error = %e, "welcome email failed");
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateEmployeeResponse {
            employee: EmployeeResponse::from(user),
            temp_password,
        }),
    ))
}

/// List employee accounts, newest first
#[utoipa::path(
    get,
    path = "/v1/admin/employees",
    responses(
        (status = 200, description = "All employee accounts", body = ListResponse<EmployeeResponse>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_employees(
    State(state): State<EmployeesState>,
    _admin: AdminUser,
) -> Result<Json<ListResponse<EmployeeResponse>>, ApiError> {
    let rows = state.db.list_employees().await?;
    let employees = rows
        .into_iter()
        .map(|row| EmployeeResponse::from(user_from_row(row)))
        .collect();
    Ok(Json(ListResponse::new(employees)))
}

pub fn routes(state: EmployeesState) -> Router {
    Router::new()
        .route(
            "/v1/admin/employees",
            post(create_employee).get(list_employees),
        )
        .with_state(state)
}
