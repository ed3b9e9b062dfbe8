// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// User models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department: String,
    pub is_active: bool,
    pub is_first_login: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department: String,
    /// True for provisioned employees (they must change the temp password);
    /// false for the seeded admin account.
    pub is_first_login: bool,
}

// ============================================
// Event models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub max_seats: i32,
    pub is_active: bool,
    pub allowed_department: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event row with the confirmed count recomputed from bookings.
#[derive(Debug, Clone, FromRow)]
pub struct EventWithCountRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub max_seats: i32,
    pub is_active: bool,
    pub allowed_department: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_count: i64,
}

#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub max_seats: i32,
    pub allowed_department: String,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdateEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub max_seats: i32,
    pub allowed_department: String,
}

// ============================================
// Booking models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub employee_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Booking joined with the employee, for the admin per-event listing.
#[derive(Debug, Clone, FromRow)]
pub struct EventBookingRow {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub employee_email: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Booking joined with the event, for an employee's own listing.
#[derive(Debug, Clone, FromRow)]
pub struct MyBookingRow {
    pub booking_id: Uuid,
    pub event_id: Uuid,
    pub event_title: String,
    pub event_location: String,
    pub event_starts_at: DateTime<Utc>,
    pub status: String,
    pub booked_at: DateTime<Utc>,
}
