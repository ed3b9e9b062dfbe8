// Postgres implementation of the booking store traits
//
// lock_event takes a row lock (SELECT ... FOR UPDATE) on the event, so every
// booking write for one event serializes while other events stay unblocked.
// Driver errors map onto the domain taxonomy: serialization failures and
// deadlocks become the retryable Conflict, a unique violation on
// (event_id, employee_id) becomes AlreadyBooked.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use seatwise_core::{
    Booking, BookingError, BookingStatus, BookingStore, BookingTx, Department, Event, MyBooking,
    NewBooking, Role, User,
};

use crate::models::{BookingRow, EventRow, MyBookingRow, UserRow};
use crate::repositories::Database;

/// Booking store backed by the shared Postgres pool.
#[derive(Clone)]
pub struct PgBookingStore {
    db: Database,
}

impl PgBookingStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// One open transaction; dropped without commit it rolls back with the
/// underlying sqlx transaction.
pub struct PgBookingTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingStore for PgBookingStore {
    type Tx = PgBookingTx;

    async fn begin(&self) -> Result<PgBookingTx, BookingError> {
        let tx = self.db.pool().begin().await.map_err(map_db_err)?;
        Ok(PgBookingTx { tx })
    }

    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<MyBooking>, BookingError> {
        let rows = self
            .db
            .list_user_bookings(user_id)
            .await
            .map_err(BookingError::Store)?;
        Ok(rows.into_iter().map(row_to_my_booking).collect())
    }
}

#[async_trait]
impl BookingTx for PgBookingTx {
    async fn lock_event(&mut self, event_id: Uuid) -> Result<Option<Event>, BookingError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, title, description, location, starts_at, max_seats, is_active, allowed_department, created_by, created_at, updated_at
            FROM events
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(event_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(row_to_event))
    }

    async fn find_user(&mut self, user_id: Uuid) -> Result<Option<User>, BookingError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, department, is_active, is_first_login, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(row_to_user))
    }

    async fn find_user_booking(
        &mut self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, event_id, employee_id, status, created_at
            FROM bookings
            WHERE event_id = $1 AND employee_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(row_to_booking))
    }

    async fn confirmed_count(&mut self, event_id: Uuid) -> Result<i64, BookingError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM bookings
            WHERE event_id = $1 AND status = 'confirmed'
            "#,
        )
        .bind(event_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(count)
    }

    async fn find_oldest_waitlisted(
        &mut self,
        event_id: Uuid,
    ) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, event_id, employee_id, status, created_at
            FROM bookings
            WHERE event_id = $1 AND status = 'waitlisted'
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(row_to_booking))
    }

    async fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking, BookingError> {
        let NewBooking {
            event_id,
            employee_id,
            status,
        } = booking;
        // Timestamp is bound here, while the event lock is held, so creation
        // order always matches serialization order. NOW() would not: it is
        // pinned at transaction begin, before the lock was acquired.
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (id, event_id, employee_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, event_id, employee_id, status, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(event_id)
        .bind(employee_id)
        .bind(status.to_string())
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                BookingError::already_booked(event_id, employee_id)
            } else {
                map_db_err(err)
            }
        })?;
        Ok(row_to_booking(row))
    }

    async fn delete_booking(&mut self, booking_id: Uuid) -> Result<(), BookingError> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn mark_confirmed(&mut self, booking_id: Uuid) -> Result<(), BookingError> {
        sqlx::query("UPDATE bookings SET status = 'confirmed' WHERE id = $1")
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), BookingError> {
        self.tx.commit().await.map_err(map_db_err)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Serialization failure / deadlock are retryable; everything else is a
/// plain store error.
fn map_db_err(err: sqlx::Error) -> BookingError {
    if let sqlx::Error::Database(ref db) = err {
        if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) {
            return BookingError::Conflict;
        }
    }
    BookingError::Store(err.into())
}

fn row_to_user(row: UserRow) -> User {
    User {
        id: row.id,
        name: row.name,
        email: row.email,
        password_hash: row.password_hash,
        role: Role::from(row.role.as_str()),
        department: Department::from(row.department.as_str()),
        is_active: row.is_active,
        is_first_login: row.is_first_login,
        created_at: row.created_at,
    }
}

fn row_to_event(row: EventRow) -> Event {
    Event {
        id: row.id,
        title: row.title,
        description: row.description,
        location: row.location,
        starts_at: row.starts_at,
        max_seats: row.max_seats,
        is_active: row.is_active,
        allowed_department: Department::from(row.allowed_department.as_str()),
        created_by: row.created_by,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn row_to_booking(row: BookingRow) -> Booking {
    Booking {
        id: row.id,
        event_id: row.event_id,
        employee_id: row.employee_id,
        status: BookingStatus::from(row.status.as_str()),
        created_at: row.created_at,
    }
}

fn row_to_my_booking(row: MyBookingRow) -> MyBooking {
    MyBooking {
        booking_id: row.booking_id,
        event_id: row.event_id,
        event_title: row.event_title,
        event_location: row.event_location,
        event_starts_at: row.event_starts_at,
        status: BookingStatus::from(row.status.as_str()),
        booked_at: row.booked_at,
    }
}
