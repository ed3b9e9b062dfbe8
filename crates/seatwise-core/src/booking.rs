// Booking domain types
//
// A booking ties one employee to one event and is either confirmed or
// waitlisted. Cancelled bookings are deleted, which frees the
// (event, employee) pair for re-booking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Booking status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Waitlisted,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Waitlisted => write!(f, "waitlisted"),
        }
    }
}

impl From<&str> for BookingStatus {
    fn from(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            _ => BookingStatus::Waitlisted,
        }
    }
}

/// A seat reservation, confirmed or waitlisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Booking {
    pub id: Uuid,
    pub event_id: Uuid,
    pub employee_id: Uuid,
    pub status: BookingStatus,
    /// Creation time; the waitlist promotes in ascending order of this field.
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a booking. Id and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub event_id: Uuid,
    pub employee_id: Uuid,
    pub status: BookingStatus,
}

/// A booking joined with the event fields an employee cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MyBooking {
    pub booking_id: Uuid,
    pub event_id: Uuid,
    pub event_title: String,
    pub event_location: String,
    pub event_starts_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub booked_at: DateTime<Utc>,
}

/// A booking joined with the employee fields an admin sees on the event roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct EventBooking {
    pub booking_id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub employee_email: String,
    pub status: BookingStatus,
    pub booked_at: DateTime<Utc>,
}

/// Result of a cancellation: the removed booking, and the waitlisted booking
/// promoted into the freed seat, if any.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub cancelled: Booking,
    pub promoted: Option<Booking>,
}
