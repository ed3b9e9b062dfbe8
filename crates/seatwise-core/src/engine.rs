// Booking workflow engine
//
// All seat accounting lives here. Each operation opens one transaction,
// locks the event row, reads a consistent picture, writes, commits, and only
// then dispatches notifications. Transient store conflicts retry the whole
// transaction a bounded number of times.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus, CancelOutcome, MyBooking, NewBooking};
use crate::error::{BookingError, NotifyError, Result};
use crate::event::Event;
use crate::notify::Notifier;
use crate::store::{BookingStore, BookingTx};
use crate::user::User;

/// Retries after the first attempt fails with a transient conflict.
const MAX_CONFLICT_RETRIES: usize = 3;

/// The booking workflow: book a seat, cancel a booking, list a user's
/// bookings. Generic over the store; notifications go through the sink
/// after commit.
pub struct BookingEngine<S> {
    store: S,
    notifier: Arc<dyn Notifier>,
}

impl<S: BookingStore> BookingEngine<S> {
    pub fn new(store: S, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Book a seat for `user_id` on `event_id`.
    ///
    /// Returns the created booking: confirmed while seats remain, waitlisted
    /// once the event is full. A full event is not an error.
    pub async fn book(&self, event_id: Uuid, user_id: Uuid) -> Result<Booking> {
        let mut retries = 0;
        let (booking, user, event) = loop {
            match self.try_book(event_id, user_id).await {
                Ok(out) => break out,
                Err(err) if err.is_transient() && retries < MAX_CONFLICT_RETRIES => {
                    retries += 1;
                    tracing::warn!(%event_id, %user_id, retries, "transient store conflict while booking, retrying");
                }
                Err(err) => return Err(err),
            }
        };

        tracing::info!(
            booking_id = %booking.id,
            %event_id,
            %user_id,
            status = %booking.status,
            "booking created"
        );

        match booking.status {
            BookingStatus::Confirmed => log_notify_failure(
                "booking_confirmed",
                self.notifier.booking_confirmed(&user, &event).await,
            ),
            BookingStatus::Waitlisted => log_notify_failure(
                "booking_waitlisted",
                self.notifier.booking_waitlisted(&user, &event).await,
            ),
        }

        Ok(booking)
    }

    /// Cancel the booking `user_id` holds for `event_id`.
    ///
    /// Cancelling a confirmed booking promotes the oldest waitlisted booking
    /// for the event, if any; cancelling a waitlisted booking never promotes.
    pub async fn cancel(&self, event_id: Uuid, user_id: Uuid) -> Result<CancelOutcome> {
        let mut retries = 0;
        let (outcome, user, event, promoted_user) = loop {
            match self.try_cancel(event_id, user_id).await {
                Ok(out) => break out,
                Err(err) if err.is_transient() && retries < MAX_CONFLICT_RETRIES => {
                    retries += 1;
                    tracing::warn!(%event_id, %user_id, retries, "transient store conflict while cancelling, retrying");
                }
                Err(err) => return Err(err),
            }
        };

        tracing::info!(
            booking_id = %outcome.cancelled.id,
            %event_id,
            %user_id,
            promoted = outcome.promoted.is_some(),
            "booking cancelled"
        );

        log_notify_failure(
            "booking_cancelled",
            self.notifier.booking_cancelled(&user, &event).await,
        );

        if let Some(promoted) = &outcome.promoted {
            match &promoted_user {
                Some(promoted_user) => log_notify_failure(
                    "promoted_from_waitlist",
                    self.notifier
                        .promoted_from_waitlist(promoted_user, &event)
                        .await,
                ),
                None => tracing::warn!(
                    booking_id = %promoted.id,
                    "promoted booking has no user row, skipping notification"
                ),
            }
        }

        Ok(outcome)
    }

    /// All bookings held by `user_id`, joined with event fields, ordered by
    /// event start time. Unknown users get an empty list.
    pub async fn my_bookings(&self, user_id: Uuid) -> Result<Vec<MyBooking>> {
        self.store.list_user_bookings(user_id).await
    }

    /// One booking attempt inside one transaction. Early returns drop the
    /// transaction, rolling it back.
    async fn try_book(&self, event_id: Uuid, user_id: Uuid) -> Result<(Booking, User, Event)> {
        let mut tx = self.store.begin().await?;

        // Lock first: every later read is consistent under the event lock.
        let event = tx
            .lock_event(event_id)
            .await?
            .ok_or(BookingError::EventNotFound(event_id))?;

        if !event.is_active {
            return Err(BookingError::EventInactive(event_id));
        }
        if event.starts_at <= Utc::now() {
            return Err(BookingError::EventAlreadyStarted(event_id));
        }

        let user = tx
            .find_user(user_id)
            .await?
            .ok_or(BookingError::UserNotFound(user_id))?;

        if !user.department.admitted_to(event.allowed_department) {
            return Err(BookingError::DepartmentRestricted { event_id });
        }

        if tx.find_user_booking(event_id, user_id).await?.is_some() {
            return Err(BookingError::already_booked(event_id, user_id));
        }

        // Decision rule: a free confirmed seat wins, otherwise the waitlist.
        let confirmed = tx.confirmed_count(event_id).await?;
        let status = if confirmed < i64::from(event.max_seats) {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Waitlisted
        };

        let booking = tx
            .insert_booking(NewBooking {
                event_id,
                employee_id: user_id,
                status,
            })
            .await?;

        tx.commit().await?;
        Ok((booking, user, event))
    }

    /// One cancellation attempt, promotion included, inside one transaction.
    async fn try_cancel(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<(CancelOutcome, User, Event, Option<User>)> {
        let mut tx = self.store.begin().await?;

        let event = tx
            .lock_event(event_id)
            .await?
            .ok_or(BookingError::EventNotFound(event_id))?;

        let booking = tx
            .find_user_booking(event_id, user_id)
            .await?
            .ok_or_else(|| BookingError::booking_not_found(event_id, user_id))?;

        let user = tx
            .find_user(user_id)
            .await?
            .ok_or(BookingError::UserNotFound(user_id))?;

        let was_confirmed = booking.status == BookingStatus::Confirmed;
        tx.delete_booking(booking.id).await?;

        // Only a freed confirmed seat pulls someone off the waitlist. The
        // promotion runs under the same event lock, so concurrent
        // cancellations cannot double-promote.
        let mut promoted = None;
        let mut promoted_user = None;
        if was_confirmed {
            if let Some(next) = tx.find_oldest_waitlisted(event_id).await? {
                tx.mark_confirmed(next.id).await?;
                promoted_user = tx.find_user(next.employee_id).await?;
                promoted = Some(Booking {
                    status: BookingStatus::Confirmed,
                    ..next
                });
            }
        }

        tx.commit().await?;
        Ok((
            CancelOutcome {
                cancelled: booking,
                promoted,
            },
            user,
            event,
            promoted_user,
        ))
    }
}

fn log_notify_failure(kind: &str, result: std::result::Result<(), NotifyError>) {
    if let Err(err) = result {
        tracing::warn!(kind, %err, "notification delivery failed, continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::user::{Department, Role};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex;

    /// Records every delivery; optionally fails them all.
    struct RecordingNotifier {
        deliveries: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                deliveries: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                deliveries: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn record(&self, entry: String) -> std::result::Result<(), NotifyError> {
            self.deliveries.lock().unwrap().push(entry);
            if self.fail {
                Err(NotifyError::new("smtp down"))
            } else {
                Ok(())
            }
        }

        fn deliveries(&self) -> Vec<String> {
            self.deliveries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn employee_created(
            &self,
            user: &User,
            _temp_password: &str,
        ) -> std::result::Result<(), NotifyError> {
            self.record(format!("created:{}", user.email))
        }

        async fn booking_confirmed(
            &self,
            user: &User,
            event: &Event,
        ) -> std::result::Result<(), NotifyError> {
            self.record(format!("confirmed:{}:{}", user.email, event.title))
        }

        async fn booking_waitlisted(
            &self,
            user: &User,
            event: &Event,
        ) -> std::result::Result<(), NotifyError> {
            self.record(format!("waitlisted:{}:{}", user.email, event.title))
        }

        async fn booking_cancelled(
            &self,
            user: &User,
            event: &Event,
        ) -> std::result::Result<(), NotifyError> {
            self.record(format!("cancelled:{}:{}", user.email, event.title))
        }

        async fn promoted_from_waitlist(
            &self,
            user: &User,
            event: &Event,
        ) -> std::result::Result<(), NotifyError> {
            self.record(format!("promoted:{}:{}", user.email, event.title))
        }
    }

    fn employee(name: &str, department: Department) -> User {
        let id = Uuid::now_v7();
        User {
            id,
            name: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: String::new(),
            role: Role::Employee,
            department,
            is_active: true,
            is_first_login: false,
            created_at: Utc::now(),
        }
    }

    fn upcoming_event(max_seats: i32, allowed_department: Department) -> Event {
        Event {
            id: Uuid::now_v7(),
            title: "Rust Workshop".to_string(),
            description: "Hands-on intro".to_string(),
            location: "Room 4".to_string(),
            starts_at: Utc::now() + Duration::days(7),
            max_seats,
            is_active: true,
            allowed_department,
            created_by: Uuid::now_v7(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn engine_with(
        users: Vec<User>,
        events: Vec<Event>,
        notifier: Arc<RecordingNotifier>,
    ) -> (BookingEngine<InMemoryStore>, InMemoryStore) {
        let store = InMemoryStore::new();
        for user in users {
            store.seed_user(user).await;
        }
        for event in events {
            store.seed_event(event).await;
        }
        let engine = BookingEngine::new(store.clone(), notifier as Arc<dyn Notifier>);
        (engine, store)
    }

    #[tokio::test]
    async fn fills_seats_then_waitlists() {
        let users: Vec<User> = (0..3)
            .map(|i| employee(&format!("emp{i}"), Department::All))
            .collect();
        let event = upcoming_event(2, Department::All);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, _) =
            engine_with(users.clone(), vec![event.clone()], notifier.clone()).await;

        let b0 = engine.book(event.id, users[0].id).await.unwrap();
        let b1 = engine.book(event.id, users[1].id).await.unwrap();
        let b2 = engine.book(event.id, users[2].id).await.unwrap();

        assert_eq!(b0.status, BookingStatus::Confirmed);
        assert_eq!(b1.status, BookingStatus::Confirmed);
        assert_eq!(b2.status, BookingStatus::Waitlisted);

        let deliveries = notifier.deliveries();
        assert_eq!(deliveries.len(), 3);
        assert!(deliveries[2].starts_with("waitlisted:emp2@example.com"));
    }

    #[tokio::test]
    async fn cancel_confirmed_promotes_oldest_waitlisted() {
        let users: Vec<User> = (0..3)
            .map(|i| employee(&format!("emp{i}"), Department::All))
            .collect();
        let event = upcoming_event(1, Department::All);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, store) =
            engine_with(users.clone(), vec![event.clone()], notifier.clone()).await;

        engine.book(event.id, users[0].id).await.unwrap();
        engine.book(event.id, users[1].id).await.unwrap();
        engine.book(event.id, users[2].id).await.unwrap();

        let outcome = engine.cancel(event.id, users[0].id).await.unwrap();
        let promoted = outcome.promoted.expect("oldest waitlisted promoted");
        assert_eq!(promoted.employee_id, users[1].id);
        assert_eq!(promoted.status, BookingStatus::Confirmed);

        // The younger waitlisted booking stays put
        let bookings = store.event_bookings(event.id).await;
        assert_eq!(bookings.len(), 2);
        assert_eq!(
            store.booking_status(event.id, users[2].id).await,
            Some(BookingStatus::Waitlisted)
        );

        let deliveries = notifier.deliveries();
        assert!(deliveries.contains(&format!("cancelled:emp0@example.com:{}", event.title)));
        assert!(deliveries.contains(&format!("promoted:emp1@example.com:{}", event.title)));
    }

    #[tokio::test]
    async fn cancel_waitlisted_never_promotes() {
        let users: Vec<User> = (0..3)
            .map(|i| employee(&format!("emp{i}"), Department::All))
            .collect();
        let event = upcoming_event(1, Department::All);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, store) =
            engine_with(users.clone(), vec![event.clone()], notifier.clone()).await;

        engine.book(event.id, users[0].id).await.unwrap();
        engine.book(event.id, users[1].id).await.unwrap();
        engine.book(event.id, users[2].id).await.unwrap();

        // users[1] is waitlisted; cancelling them must not promote users[2]
        let outcome = engine.cancel(event.id, users[1].id).await.unwrap();
        assert!(outcome.promoted.is_none());
        assert_eq!(
            store.booking_status(event.id, users[0].id).await,
            Some(BookingStatus::Confirmed)
        );
        assert_eq!(
            store.booking_status(event.id, users[2].id).await,
            Some(BookingStatus::Waitlisted)
        );
        assert!(!notifier
            .deliveries()
            .iter()
            .any(|d| d.starts_with("promoted:")));
    }

    #[tokio::test]
    async fn cancel_with_empty_waitlist_frees_the_seat() {
        let users = vec![
            employee("emp0", Department::All),
            employee("emp1", Department::All),
        ];
        let event = upcoming_event(1, Department::All);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, _) =
            engine_with(users.clone(), vec![event.clone()], notifier.clone()).await;

        engine.book(event.id, users[0].id).await.unwrap();
        let outcome = engine.cancel(event.id, users[0].id).await.unwrap();
        assert!(outcome.promoted.is_none());

        // The freed seat goes to the next booker
        let booking = engine.book(event.id, users[1].id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn department_restriction_rejects_and_admits() {
        let sales = employee("sales", Department::Sales);
        let eng = employee("eng", Department::Engineering);
        let event = upcoming_event(10, Department::Engineering);
        let open_event = upcoming_event(10, Department::All);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, _) = engine_with(
            vec![sales.clone(), eng.clone()],
            vec![event.clone(), open_event.clone()],
            notifier,
        )
        .await;

        let err = engine.book(event.id, sales.id).await.unwrap_err();
        assert!(matches!(err, BookingError::DepartmentRestricted { .. }));

        // Matching department is admitted, and `all` admits everyone
        assert!(engine.book(event.id, eng.id).await.is_ok());
        assert!(engine.book(open_event.id, sales.id).await.is_ok());
    }

    #[tokio::test]
    async fn book_cancel_rebook_succeeds() {
        let user = employee("emp0", Department::All);
        let event = upcoming_event(5, Department::All);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, _) = engine_with(vec![user.clone()], vec![event.clone()], notifier).await;

        engine.book(event.id, user.id).await.unwrap();
        engine.cancel(event.id, user.id).await.unwrap();
        let booking = engine.book(event.id, user.id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn double_booking_is_rejected_regardless_of_status() {
        let users = vec![
            employee("emp0", Department::All),
            employee("emp1", Department::All),
        ];
        let event = upcoming_event(1, Department::All);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, _) =
            engine_with(users.clone(), vec![event.clone()], notifier).await;

        engine.book(event.id, users[0].id).await.unwrap();
        let err = engine.book(event.id, users[0].id).await.unwrap_err();
        assert!(matches!(err, BookingError::AlreadyBooked { .. }));

        // A waitlisted booking blocks re-booking too
        engine.book(event.id, users[1].id).await.unwrap();
        let err = engine.book(event.id, users[1].id).await.unwrap_err();
        assert!(matches!(err, BookingError::AlreadyBooked { .. }));
    }

    #[tokio::test]
    async fn booking_preconditions_fail_with_exact_kinds() {
        let user = employee("emp0", Department::All);
        let mut inactive = upcoming_event(5, Department::All);
        inactive.is_active = false;
        let mut started = upcoming_event(5, Department::All);
        started.starts_at = Utc::now() - Duration::hours(1);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, _) = engine_with(
            vec![user.clone()],
            vec![inactive.clone(), started.clone()],
            notifier,
        )
        .await;

        let missing_event = Uuid::now_v7();
        assert!(matches!(
            engine.book(missing_event, user.id).await.unwrap_err(),
            BookingError::EventNotFound(id) if id == missing_event
        ));
        assert!(matches!(
            engine.book(inactive.id, user.id).await.unwrap_err(),
            BookingError::EventInactive(_)
        ));
        assert!(matches!(
            engine.book(started.id, user.id).await.unwrap_err(),
            BookingError::EventAlreadyStarted(_)
        ));

        let missing_user = Uuid::now_v7();
        let open = upcoming_event(5, Department::All);
        let (engine, _) = engine_with(
            vec![user.clone()],
            vec![open.clone()],
            Arc::new(RecordingNotifier::new()),
        )
        .await;
        assert!(matches!(
            engine.book(open.id, missing_user).await.unwrap_err(),
            BookingError::UserNotFound(id) if id == missing_user
        ));
    }

    #[tokio::test]
    async fn cancelling_without_a_booking_fails() {
        let user = employee("emp0", Department::All);
        let event = upcoming_event(5, Department::All);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, _) =
            engine_with(vec![user.clone()], vec![event.clone()], notifier).await;

        let err = engine.cancel(event.id, user.id).await.unwrap_err();
        assert!(matches!(err, BookingError::BookingNotFound { .. }));

        let missing_event = Uuid::now_v7();
        let err = engine.cancel(missing_event, user.id).await.unwrap_err();
        assert!(matches!(err, BookingError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn last_seat_boundary() {
        let users: Vec<User> = (0..4)
            .map(|i| employee(&format!("emp{i}"), Department::All))
            .collect();
        let event = upcoming_event(3, Department::All);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, _) =
            engine_with(users.clone(), vec![event.clone()], notifier).await;

        // count == max_seats - 1: still confirmed
        engine.book(event.id, users[0].id).await.unwrap();
        engine.book(event.id, users[1].id).await.unwrap();
        let last = engine.book(event.id, users[2].id).await.unwrap();
        assert_eq!(last.status, BookingStatus::Confirmed);

        // count == max_seats: waitlisted
        let over = engine.book(event.id, users[3].id).await.unwrap();
        assert_eq!(over.status, BookingStatus::Waitlisted);
    }

    #[tokio::test]
    async fn notification_failure_never_fails_the_operation() {
        let users = vec![
            employee("emp0", Department::All),
            employee("emp1", Department::All),
        ];
        let event = upcoming_event(1, Department::All);
        let notifier = Arc::new(RecordingNotifier::failing());
        let (engine, store) =
            engine_with(users.clone(), vec![event.clone()], notifier.clone()).await;

        let booking = engine.book(event.id, users[0].id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        engine.book(event.id, users[1].id).await.unwrap();

        let outcome = engine.cancel(event.id, users[0].id).await.unwrap();
        assert!(outcome.promoted.is_some());

        // Every send was attempted and failed, yet state moved on
        assert_eq!(notifier.deliveries().len(), 4);
        assert_eq!(
            store.booking_status(event.id, users[1].id).await,
            Some(BookingStatus::Confirmed)
        );
    }

    #[tokio::test]
    async fn concurrent_bookings_for_last_seat_split_confirmed_and_waitlisted() {
        let users = vec![
            employee("emp0", Department::All),
            employee("emp1", Department::All),
        ];
        let event = upcoming_event(1, Department::All);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, store) =
            engine_with(users.clone(), vec![event.clone()], notifier).await;
        let engine = Arc::new(engine);

        let a = tokio::spawn({
            let engine = engine.clone();
            let event_id = event.id;
            let user_id = users[0].id;
            async move { engine.book(event_id, user_id).await }
        });
        let b = tokio::spawn({
            let engine = engine.clone();
            let event_id = event.id;
            let user_id = users[1].id;
            async move { engine.book(event_id, user_id).await }
        });

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        let statuses = [a.status, b.status];
        assert!(statuses.contains(&BookingStatus::Confirmed));
        assert!(statuses.contains(&BookingStatus::Waitlisted));
        assert_eq!(store.event_bookings(event.id).await.len(), 2);
    }

    #[tokio::test]
    async fn my_bookings_joins_event_fields() {
        let user = employee("emp0", Department::All);
        let mut early = upcoming_event(5, Department::All);
        early.title = "Early".to_string();
        early.starts_at = Utc::now() + Duration::days(1);
        let mut late = upcoming_event(5, Department::All);
        late.title = "Late".to_string();
        late.starts_at = Utc::now() + Duration::days(30);
        let notifier = Arc::new(RecordingNotifier::new());
        let (engine, _) = engine_with(
            vec![user.clone()],
            vec![late.clone(), early.clone()],
            notifier,
        )
        .await;

        // Book in reverse start order; listing sorts by event start time
        engine.book(late.id, user.id).await.unwrap();
        engine.book(early.id, user.id).await.unwrap();

        let bookings = engine.my_bookings(user.id).await.unwrap();
        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[0].event_title, "Early");
        assert_eq!(bookings[1].event_title, "Late");
        assert_eq!(bookings[0].event_location, early.location);

        // Unknown users get an empty list, not an error
        assert!(engine.my_bookings(Uuid::now_v7()).await.unwrap().is_empty());
    }
}
