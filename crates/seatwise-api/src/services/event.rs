// Event administration and browsing service
//
// Validation and row mapping around the event tables. Seat counting and
// waitlist movement never happen here; that belongs to the booking engine.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use seatwise_core::{
    BookingError, BookingStatus, Department, Event, EventBooking, EventDraft, EventSummary, Result,
};
use seatwise_storage::{
    CreateEvent, Database, EventBookingRow, EventRow, EventWithCountRow, UpdateEvent,
};

pub struct EventService {
    db: Arc<Database>,
}

impl EventService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Active future events with live confirmed counts, soonest first.
    pub async fn list_upcoming(&self) -> Result<Vec<EventSummary>> {
        let rows = self
            .db
            .list_upcoming_events()
            .await
            .map_err(BookingError::Store)?;
        Ok(rows.into_iter().map(Self::row_to_summary).collect())
    }

    pub async fn get_summary(&self, id: Uuid) -> Result<EventSummary> {
        let row = self
            .db
            .get_event_with_count(id)
            .await
            .map_err(BookingError::Store)?
            .ok_or(BookingError::EventNotFound(id))?;
        Ok(Self::row_to_summary(row))
    }

    pub async fn create(&self, draft: EventDraft, created_by: Uuid) -> Result<EventSummary> {
        draft.validate(Utc::now())?;
        let row = self
            .db
            .create_event(CreateEvent {
                title: draft.title,
                description: draft.description,
                location: draft.location,
                starts_at: draft.starts_at,
                max_seats: draft.max_seats,
                allowed_department: draft.allowed_department.to_string(),
                created_by,
            })
            .await
            .map_err(BookingError::Store)?;
        tracing::info!(event_id = %row.id, title = %row.title, "event created");
        // A fresh event cannot have bookings yet
        Ok(EventSummary::new(Self::row_to_event(row), 0))
    }

    /// Replace the editable fields. Lowering max_seats below the confirmed
    /// count is allowed and never demotes anyone; the event simply stays
    /// full until enough cancellations come in.
    pub async fn update(&self, id: Uuid, draft: EventDraft) -> Result<EventSummary> {
        draft.validate(Utc::now())?;
        let row = self
            .db
            .update_event(
                id,
                UpdateEvent {
                    title: draft.title,
                    description: draft.description,
                    location: draft.location,
                    starts_at: draft.starts_at,
                    max_seats: draft.max_seats,
                    allowed_department: draft.allowed_department.to_string(),
                },
            )
            .await
            .map_err(BookingError::Store)?
            .ok_or(BookingError::EventNotFound(id))?;
        tracing::info!(event_id = %row.id, "event updated");
        self.get_summary(id).await
    }

    /// Deactivated events stop taking bookings but keep the ones they have.
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<EventSummary> {
        let row = self
            .db
            .set_event_active(id, is_active)
            .await
            .map_err(BookingError::Store)?
            .ok_or(BookingError::EventNotFound(id))?;
        tracing::info!(event_id = %row.id, is_active, "event active flag changed");
        self.get_summary(id).await
    }

    /// Admin roster for one event: confirmed seats first, then the waitlist
    /// in promotion order.
    pub async fn bookings(&self, event_id: Uuid) -> Result<Vec<EventBooking>> {
        if self
            .db
            .get_event(event_id)
            .await
            .map_err(BookingError::Store)?
            .is_none()
        {
            return Err(BookingError::EventNotFound(event_id));
        }
        let rows = self
            .db
            .list_event_bookings(event_id)
            .await
            .map_err(BookingError::Store)?;
        Ok(rows.into_iter().map(Self::row_to_event_booking).collect())
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

    fn row_to_summary(row: EventWithCountRow) -> EventSummary {
        let confirmed_count = row.confirmed_count;
        EventSummary::new(
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
            },
            confirmed_count,
        )
    }

    fn row_to_event_booking(row: EventBookingRow) -> EventBooking {
        EventBooking {
            booking_id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            employee_email: row.employee_email,
            status: BookingStatus::from(row.status.as_str()),
            booked_at: row.created_at,
        }
    }
}
