// Storage traits consumed by the booking engine
//
// The engine never talks to a database directly. It opens a transaction
// through BookingStore, performs its reads and writes through BookingTx, and
// commits. Implementations: Postgres (seatwise-storage) and the in-memory
// store in this crate.

use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, MyBooking, NewBooking};
use crate::error::Result;
use crate::event::Event;
use crate::user::User;

/// Storage backend capable of transactional booking work.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Transaction handle produced by `begin`.
    type Tx: BookingTx;

    /// Open a transaction. All engine mutations run inside one.
    async fn begin(&self) -> Result<Self::Tx>;

    /// A user's bookings joined with event title, location and start time,
    /// ordered by event start time ascending. Read-only, no transaction.
    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<MyBooking>>;
}

/// A unit of work over users, events and bookings.
///
/// Contract:
/// - `lock_event` takes the per-event lock; bookings for that event made by
///   other transactions block until this one finishes. It must be the first
///   call so every later read is consistent under the lock.
/// - Writes become visible atomically at `commit`.
/// - Dropping the transaction without committing rolls everything back.
#[async_trait]
pub trait BookingTx: Send {
    /// Fetch the event and acquire its lock. `None` if the event does not
    /// exist.
    async fn lock_event(&mut self, event_id: Uuid) -> Result<Option<Event>>;

    /// Fetch a user by id.
    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>>;

    /// Fetch the booking held by `user_id` for `event_id`, any status.
    async fn find_user_booking(
        &mut self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Booking>>;

    /// Number of confirmed bookings for the event.
    async fn confirmed_count(&mut self, event_id: Uuid) -> Result<i64>;

    /// The waitlisted booking with the earliest creation time, if any.
    async fn find_oldest_waitlisted(&mut self, event_id: Uuid) -> Result<Option<Booking>>;

    /// Insert a booking; the store assigns id and creation time.
    async fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking>;

    /// Delete a booking by id.
    async fn delete_booking(&mut self, booking_id: Uuid) -> Result<()>;

    /// Flip a booking's status to confirmed.
    async fn mark_confirmed(&mut self, booking_id: Uuid) -> Result<()>;

    /// Commit the transaction, publishing all writes.
    async fn commit(self) -> Result<()>;
}
