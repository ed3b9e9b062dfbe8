// Error types for the booking workflow

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for booking operations
pub type Result<T> = std::result::Result<T, BookingError>;

/// Errors that can occur while booking, cancelling, or administering events.
///
/// This is a closed set: callers match exhaustively and the HTTP layer maps
/// each variant to one status code. A full event is not represented here;
/// booking a full event succeeds with a waitlisted booking.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Event does not exist
    #[error("Event not found: {0}")]
    EventNotFound(Uuid),

    /// User does not exist
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// No booking for this (event, user) pair
    #[error("Booking not found for event {event_id} and user {user_id}")]
    BookingNotFound { event_id: Uuid, user_id: Uuid },

    /// Event exists but is deactivated
    #[error("Event is not active: {0}")]
    EventInactive(Uuid),

    /// Event start time has passed
    #[error("Event has already started: {0}")]
    EventAlreadyStarted(Uuid),

    /// User already holds a booking (confirmed or waitlisted) for this event
    #[error("User {user_id} already has a booking for event {event_id}")]
    AlreadyBooked { event_id: Uuid, user_id: Uuid },

    /// Event is restricted to a department the user is not part of
    #[error("Event {event_id} is restricted to another department")]
    DepartmentRestricted { event_id: Uuid },

    /// Event date must be in the future
    #[error("Event date must be in the future")]
    PastEventDate,

    /// Seat capacity must be positive
    #[error("Seat capacity must be greater than zero")]
    NonPositiveSeats,

    /// Transient store conflict (serialization failure, deadlock); retryable
    #[error("Transient store conflict, retry")]
    Conflict,

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl BookingError {
    /// Create a store error from any underlying cause
    pub fn store(msg: impl Into<String>) -> Self {
        BookingError::Store(anyhow::anyhow!(msg.into()))
    }

    /// Create a booking not found error
    pub fn booking_not_found(event_id: Uuid, user_id: Uuid) -> Self {
        BookingError::BookingNotFound { event_id, user_id }
    }

    /// Create an already booked error
    pub fn already_booked(event_id: Uuid, user_id: Uuid) -> Self {
        BookingError::AlreadyBooked { event_id, user_id }
    }

    /// Whether retrying the whole transaction may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, BookingError::Conflict)
    }
}

/// Notification delivery failure. Callers log and swallow this; it never
/// aborts or rolls back the booking operation that triggered the send.
#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

impl NotifyError {
    pub fn new(msg: impl Into<String>) -> Self {
        NotifyError(msg.into())
    }
}
