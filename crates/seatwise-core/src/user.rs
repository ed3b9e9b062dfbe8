// User domain types
//
// These types represent employee and admin accounts.
// Used by both the API and storage crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Account role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Employee => write!(f, "employee"),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::Employee,
        }
    }
}

/// Department an employee belongs to. Events can be restricted to one
/// department; `All` on an event admits everyone.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Department {
    #[default]
    All,
    Engineering,
    Sales,
    Marketing,
    Operations,
}

impl Department {
    /// Whether an employee of this department may attend an event
    /// restricted to `allowed`.
    pub fn admitted_to(&self, allowed: Department) -> bool {
        allowed == Department::All || *self == allowed
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Department::All => write!(f, "all"),
            Department::Engineering => write!(f, "engineering"),
            Department::Sales => write!(f, "sales"),
            Department::Marketing => write!(f, "marketing"),
            Department::Operations => write!(f, "operations"),
        }
    }
}

impl From<&str> for Department {
    fn from(s: &str) -> Self {
        match s {
            "engineering" => Department::Engineering,
            "sales" => Department::Sales,
            "marketing" => Department::Marketing,
            "operations" => Department::Operations,
            _ => Department::All,
        }
    }
}

/// An account that can log in: an employee who books seats, or an admin
/// who manages events and accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub department: Department,
    pub is_active: bool,
    pub is_first_login: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_admission() {
        assert!(Department::Sales.admitted_to(Department::All));
        assert!(Department::Sales.admitted_to(Department::Sales));
        assert!(!Department::Sales.admitted_to(Department::Engineering));
        // An "all" employee is only admitted everywhere via the event side
        assert!(Department::All.admitted_to(Department::All));
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from("employee"), Role::Employee);
        assert_eq!(Role::from("unknown"), Role::Employee);
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_department_serde_lowercase() {
        let json = serde_json::to_string(&Department::Engineering).unwrap();
        assert_eq!(json, r#""engineering""#);
        let dept: Department = serde_json::from_str(r#""operations""#).unwrap();
        assert_eq!(dept, Department::Operations);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::now_v7(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            role: Role::Employee,
            department: Department::Sales,
            is_active: true,
            is_first_login: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
