// In-memory store
//
// Backs the engine tests and works for local development without Postgres.
// A transaction owns the single state lock and mutates a scratch copy;
// commit writes the copy back, drop discards it. The store-wide lock is
// coarser than the per-event row lock the SQL store takes, but it serializes
// the same writes, so every engine invariant holds identically.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, MyBooking, NewBooking};
use crate::error::Result;
use crate::event::Event;
use crate::store::{BookingStore, BookingTx};
use crate::user::User;

#[derive(Default, Clone)]
struct MemState {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
    bookings: HashMap<Uuid, Booking>,
}

/// HashMap-backed implementation of the store traits.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id, user);
    }

    pub async fn seed_event(&self, event: Event) {
        self.state.lock().await.events.insert(event.id, event);
    }

    /// All bookings for an event in creation order.
    pub async fn event_bookings(&self, event_id: Uuid) -> Vec<Booking> {
        let state = self.state.lock().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.event_id == event_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.created_at, b.id));
        bookings
    }

    /// Status of the booking `user_id` holds for `event_id`, if any.
    pub async fn booking_status(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Option<BookingStatus> {
        let state = self.state.lock().await;
        state
            .bookings
            .values()
            .find(|b| b.event_id == event_id && b.employee_id == user_id)
            .map(|b| b.status)
    }
}

/// Transaction over the in-memory state. Holding `guard` keeps every other
/// transaction out until commit or drop.
pub struct InMemoryTx {
    guard: OwnedMutexGuard<MemState>,
    scratch: MemState,
}

#[async_trait]
impl BookingStore for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.state.clone().lock_owned().await;
        let scratch = guard.clone();
        Ok(InMemoryTx { guard, scratch })
    }

    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<MyBooking>> {
        let state = self.state.lock().await;
        let mut rows: Vec<MyBooking> = state
            .bookings
            .values()
            .filter(|b| b.employee_id == user_id)
            .filter_map(|b| {
                state.events.get(&b.event_id).map(|e| MyBooking {
                    booking_id: b.id,
                    event_id: e.id,
                    event_title: e.title.clone(),
                    event_location: e.location.clone(),
                    event_starts_at: e.starts_at,
                    status: b.status,
                    booked_at: b.created_at,
                })
            })
            .collect();
        rows.sort_by_key(|r| (r.event_starts_at, r.booking_id));
        Ok(rows)
    }
}

#[async_trait]
impl BookingTx for InMemoryTx {
    async fn lock_event(&mut self, event_id: Uuid) -> Result<Option<Event>> {
        Ok(self.scratch.events.get(&event_id).cloned())
    }

    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.scratch.users.get(&user_id).cloned())
    }

    async fn find_user_booking(
        &mut self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Booking>> {
        Ok(self
            .scratch
            .bookings
            .values()
            .find(|b| b.event_id == event_id && b.employee_id == user_id)
            .cloned())
    }

    async fn confirmed_count(&mut self, event_id: Uuid) -> Result<i64> {
        Ok(self
            .scratch
            .bookings
            .values()
            .filter(|b| b.event_id == event_id && b.status == BookingStatus::Confirmed)
            .count() as i64)
    }

    async fn find_oldest_waitlisted(&mut self, event_id: Uuid) -> Result<Option<Booking>> {
        Ok(self
            .scratch
            .bookings
            .values()
            .filter(|b| b.event_id == event_id && b.status == BookingStatus::Waitlisted)
            .min_by_key(|b| (b.created_at, b.id))
            .cloned())
    }

    async fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking> {
        let booking = Booking {
            id: Uuid::now_v7(),
            event_id: booking.event_id,
            employee_id: booking.employee_id,
            status: booking.status,
            created_at: Utc::now(),
        };
        self.scratch.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn delete_booking(&mut self, booking_id: Uuid) -> Result<()> {
        self.scratch.bookings.remove(&booking_id);
        Ok(())
    }

    async fn mark_confirmed(&mut self, booking_id: Uuid) -> Result<()> {
        if let Some(booking) = self.scratch.bookings.get_mut(&booking_id) {
            booking.status = BookingStatus::Confirmed;
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let InMemoryTx { mut guard, scratch } = self;
        *guard = scratch;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{Department, Role};
    use chrono::Duration;

    fn sample_event() -> Event {
        Event {
            id: Uuid::now_v7(),
            title: "Town Hall".to_string(),
            description: String::new(),
            location: "HQ".to_string(),
            starts_at: Utc::now() + Duration::days(3),
            max_seats: 10,
            is_active: true,
            allowed_department: Department::All,
            created_by: Uuid::now_v7(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_user() -> User {
        User {
            id: Uuid::now_v7(),
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Employee,
            department: Department::Sales,
            is_active: true,
            is_first_login: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = InMemoryStore::new();
        let event = sample_event();
        let user = sample_user();
        store.seed_event(event.clone()).await;
        store.seed_user(user.clone()).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_booking(NewBooking {
                event_id: event.id,
                employee_id: user.id,
                status: BookingStatus::Confirmed,
            })
            .await
            .unwrap();
            // dropped without commit
        }

        assert!(store.event_bookings(event.id).await.is_empty());
    }

    #[tokio::test]
    async fn committed_writes_become_visible_atomically() {
        let store = InMemoryStore::new();
        let event = sample_event();
        let user = sample_user();
        store.seed_event(event.clone()).await;
        store.seed_user(user.clone()).await;

        let mut tx = store.begin().await.unwrap();
        let booking = tx
            .insert_booking(NewBooking {
                event_id: event.id,
                employee_id: user.id,
                status: BookingStatus::Waitlisted,
            })
            .await
            .unwrap();
        tx.mark_confirmed(booking.id).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(
            store.booking_status(event.id, user.id).await,
            Some(BookingStatus::Confirmed)
        );
    }

    #[tokio::test]
    async fn transactions_serialize_on_the_state_lock() {
        let store = InMemoryStore::new();
        let event = sample_event();
        store.seed_event(event.clone()).await;

        let mut tx = store.begin().await.unwrap();
        assert!(tx.lock_event(event.id).await.unwrap().is_some());

        // A second begin() must wait until the first transaction ends
        let pending = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut tx = store.begin().await.unwrap();
                tx.lock_event(event.id).await.unwrap().is_some()
            })
        };
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        tx.commit().await.unwrap();
        assert!(pending.await.unwrap());
    }
}
