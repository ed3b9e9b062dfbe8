// Authentication and authorization
//
// JWT access tokens signed with HS256, Argon2id password hashing, and
// role-gated request extractors.

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod routes;

pub use config::AuthConfig;
pub use middleware::{AdminUser, AuthState, AuthUser, EmployeeUser, FromRef};
pub use routes::{ensure_admin_user, AuthApiState};
