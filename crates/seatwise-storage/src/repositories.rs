// Repository layer for database operations
// Users, events, and booking listings; the transactional booking path lives
// in booking_store.rs

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUser) -> Result<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, department, is_first_login)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, email, password_hash, role, department, is_active, is_first_login, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.role)
        .bind(&input.department)
        .bind(input.is_first_login)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, department, is_active, is_first_login, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, department, is_active, is_first_login, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_employees(&self) -> Result<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, role, department, is_active, is_first_login, created_at
            FROM users
            WHERE role = 'employee'
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Store a new password hash and clear the first-login flag.
    pub async fn update_user_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, is_first_login = FALSE
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEvent) -> Result<EventRow> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (id, title, description, location, starts_at, max_seats, allowed_department, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, location, starts_at, max_seats, is_active, allowed_department, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.location)
        .bind(input.starts_at)
        .bind(input.max_seats)
        .bind(&input.allowed_department)
        .bind(input.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, title, description, location, starts_at, max_seats, is_active, allowed_department, created_by, created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_event(&self, id: Uuid, input: UpdateEvent) -> Result<Option<EventRow>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            UPDATE events
            SET title = $2, description = $3, location = $4, starts_at = $5,
                max_seats = $6, allowed_department = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, location, starts_at, max_seats, is_active, allowed_department, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.location)
        .bind(input.starts_at)
        .bind(input.max_seats)
        .bind(&input.allowed_department)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn set_event_active(&self, id: Uuid, is_active: bool) -> Result<Option<EventRow>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            UPDATE events
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, location, starts_at, max_seats, is_active, allowed_department, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Active future events with their confirmed counts, soonest first.
    pub async fn list_upcoming_events(&self) -> Result<Vec<EventWithCountRow>> {
        let rows = sqlx::query_as::<_, EventWithCountRow>(
            r#"
            SELECT e.id, e.title, e.description, e.location, e.starts_at, e.max_seats,
                   e.is_active, e.allowed_department, e.created_by, e.created_at, e.updated_at,
                   COUNT(b.id) FILTER (WHERE b.status = 'confirmed') AS confirmed_count
            FROM events e
            LEFT JOIN bookings b ON b.event_id = e.id
            WHERE e.is_active AND e.starts_at > NOW()
            GROUP BY e.id
            ORDER BY e.starts_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_event_with_count(&self, id: Uuid) -> Result<Option<EventWithCountRow>> {
        let row = sqlx::query_as::<_, EventWithCountRow>(
            r#"
            SELECT e.id, e.title, e.description, e.location, e.starts_at, e.max_seats,
                   e.is_active, e.allowed_department, e.created_by, e.created_at, e.updated_at,
                   COUNT(b.id) FILTER (WHERE b.status = 'confirmed') AS confirmed_count
            FROM events e
            LEFT JOIN bookings b ON b.event_id = e.id
            WHERE e.id = $1
            GROUP BY e.id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // ============================================
    // Booking listings
    // ============================================

    /// Admin view: everyone booked on an event, confirmed seats first, then
    /// by booking age.
    pub async fn list_event_bookings(&self, event_id: Uuid) -> Result<Vec<EventBookingRow>> {
        let rows = sqlx::query_as::<_, EventBookingRow>(
            r#"
            SELECT b.id, b.employee_id, u.name AS employee_name, u.email AS employee_email,
                   b.status, b.created_at
            FROM bookings b
            JOIN users u ON u.id = b.employee_id
            WHERE b.event_id = $1
            ORDER BY CASE b.status WHEN 'confirmed' THEN 0 ELSE 1 END, b.created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// An employee's bookings joined with event fields, by event start time.
    pub async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<MyBookingRow>> {
        let rows = sqlx::query_as::<_, MyBookingRow>(
            r#"
            SELECT b.id AS booking_id, b.event_id, e.title AS event_title,
                   e.location AS event_location, e.starts_at AS event_starts_at,
                   b.status, b.created_at AS booked_at
            FROM bookings b
            JOIN events e ON e.id = b.event_id
            WHERE b.employee_id = $1
            ORDER BY e.starts_at ASC, b.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Whether the error is a Postgres unique-constraint violation (SQLSTATE
/// 23505), e.g. a duplicate email on user creation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| match e {
            sqlx::Error::Database(db) => db.code().map(|c| c == "23505"),
            _ => None,
        })
        .unwrap_or(false)
}
