// Event domain types
//
// An event has a fixed seat capacity. The confirmed count is never stored on
// the event; it is recomputed from bookings wherever it is needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::BookingError;
use crate::user::Department;

/// A bookable company event (training session, social event, team activity).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Start time; bookings close once this has passed.
    pub starts_at: DateTime<Utc>,
    /// Seat capacity. Confirmed bookings never exceed this.
    pub max_seats: i32,
    /// Inactive events reject new bookings but keep existing ones.
    pub is_active: bool,
    /// Department restriction; `All` admits every employee.
    pub allowed_department: Department,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an admin supplies when creating or updating an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub max_seats: i32,
    pub allowed_department: Department,
}

impl EventDraft {
    /// Validate draft fields against the booking rules: the event must start
    /// in the future and offer at least one seat.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), BookingError> {
        if self.starts_at <= now {
            return Err(BookingError::PastEventDate);
        }
        if self.max_seats <= 0 {
            return Err(BookingError::NonPositiveSeats);
        }
        Ok(())
    }
}

/// An event together with its live confirmed-seat count, as shown to browsing
/// employees and returned from the admin endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub max_seats: i32,
    pub is_active: bool,
    pub allowed_department: Department,
    /// Bookings currently holding a seat.
    pub confirmed_count: i64,
    /// Seats still open. Zero when full, and also zero when an admin lowered
    /// `max_seats` below the confirmed count (existing bookings are kept).
    pub available_seats: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventSummary {
    pub fn new(event: Event, confirmed_count: i64) -> Self {
        let available_seats = (i64::from(event.max_seats) - confirmed_count).max(0);
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            location: event.location,
            starts_at: event.starts_at,
            max_seats: event.max_seats,
            is_active: event.is_active,
            allowed_department: event.allowed_department,
            confirmed_count,
            available_seats,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(starts_at: DateTime<Utc>, max_seats: i32) -> EventDraft {
        EventDraft {
            title: "Rust Workshop".to_string(),
            description: "Hands-on intro".to_string(),
            location: "Room 4".to_string(),
            starts_at,
            max_seats,
            allowed_department: Department::All,
        }
    }

    #[test]
    fn test_validate_accepts_future_event() {
        let now = Utc::now();
        assert!(draft(now + Duration::days(1), 10).validate(now).is_ok());
    }

    #[test]
    fn test_validate_rejects_past_date() {
        let now = Utc::now();
        let err = draft(now - Duration::hours(1), 10).validate(now).unwrap_err();
        assert!(matches!(err, BookingError::PastEventDate));
        // Starting exactly now is also rejected
        let err = draft(now, 10).validate(now).unwrap_err();
        assert!(matches!(err, BookingError::PastEventDate));
    }

    #[test]
    fn test_validate_rejects_non_positive_seats() {
        let now = Utc::now();
        let err = draft(now + Duration::days(1), 0).validate(now).unwrap_err();
        assert!(matches!(err, BookingError::NonPositiveSeats));
        let err = draft(now + Duration::days(1), -3).validate(now).unwrap_err();
        assert!(matches!(err, BookingError::NonPositiveSeats));
    }

    #[test]
    fn test_summary_available_seats_never_negative() {
        let event = Event {
            id: Uuid::now_v7(),
            title: "Town Hall".to_string(),
            description: String::new(),
            location: "Main Hall".to_string(),
            starts_at: Utc::now() + Duration::days(2),
            max_seats: 3,
            is_active: true,
            allowed_department: Department::All,
            created_by: Uuid::now_v7(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let summary = EventSummary::new(event.clone(), 1);
        assert_eq!(summary.available_seats, 2);

        // Admin lowered max_seats below the confirmed count
        let summary = EventSummary::new(event, 5);
        assert_eq!(summary.confirmed_count, 5);
        assert_eq!(summary.available_seats, 0);
    }
}
