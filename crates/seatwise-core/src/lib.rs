// Booking Workflow Engine
//
// This crate provides a DB-agnostic implementation of the booking workflow:
// book a seat, cancel a booking, promote from the waitlist.
//
// Key design decisions:
// - Uses traits (BookingStore, BookingTx, Notifier) for pluggable backends
// - Every booking mutation runs inside one explicit transaction; the event row
//   is locked first, so writes for one event serialize while different events
//   proceed in parallel
// - Capacity is never stored: the confirmed count is recomputed under the lock
//   and compared against max_seats to decide confirmed vs waitlisted
// - Waitlist promotion is FIFO by booking creation time and happens inside the
//   cancelling transaction
// - Notifications are dispatched after commit and never fail the operation
// - Error handling is a closed enum (BookingError); "event full" is an outcome
//   (a waitlisted booking), not an error

// Domain entity types
pub mod booking;
pub mod event;
pub mod user;

pub mod engine;
pub mod error;
pub mod notify;
pub mod store;

// In-memory implementation for tests and local development
pub mod memory;

// Re-exports for convenience
pub use booking::{Booking, BookingStatus, CancelOutcome, EventBooking, MyBooking, NewBooking};
pub use engine::BookingEngine;
pub use error::{BookingError, NotifyError, Result};
pub use event::{Event, EventDraft, EventSummary};
pub use memory::InMemoryStore;
pub use notify::{NoopNotifier, Notifier};
pub use store::{BookingStore, BookingTx};
pub use user::{Department, Role, User};
