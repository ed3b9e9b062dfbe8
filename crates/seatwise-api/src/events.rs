// Event routes: browsing for signed-in users, administration for admins

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use seatwise_core::{Department, EventBooking, EventDraft, EventSummary};

use crate::auth::{AdminUser, AuthState, AuthUser, FromRef};
use crate::common::{ApiError, ListResponse};
use crate::services::EventService;

/// State for event routes
#[derive(Clone)]
pub struct EventsState {
    pub service: Arc<EventService>,
    pub auth: AuthState,
}

impl FromRef<EventsState> for AuthState {
    fn from_ref(state: &EventsState) -> Self {
        state.auth.clone()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub max_seats: i32,
    #[serde(default)]
    pub allowed_department: Department,
}

impl CreateEventRequest {
    fn into_draft(self) -> EventDraft {
        EventDraft {
            title: self.title,
            description: self.description,
            location: self.location,
            starts_at: self.starts_at,
            max_seats: self.max_seats,
            allowed_department: self.allowed_department,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub max_seats: i32,
    #[serde(default)]
    pub allowed_department: Department,
}

impl UpdateEventRequest {
    fn into_draft(self) -> EventDraft {
        EventDraft {
            title: self.title,
            description: self.description,
            location: self.location,
            starts_at: self.starts_at,
            max_seats: self.max_seats,
            allowed_department: self.allowed_department,
        }
    }
}

/// List upcoming bookable events
#[utoipa::path(
    get,
    path = "/v1/events",
    responses(
        (status = 200, description = "Active future events with seat counts", body = ListResponse<EventSummary>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<EventsState>,
    _auth: AuthUser,
) -> Result<Json<ListResponse<EventSummary>>, ApiError> {
    let events = state.service.list_upcoming().await?;
    Ok(Json(ListResponse::new(events)))
}

/// Create an event
#[utoipa::path(
    post,
    path = "/v1/admin/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventSummary),
        (status = 400, description = "Rejected draft"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn create_event(
    State(state): State<EventsState>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventSummary>), ApiError> {
    let event = state.service.create(req.into_draft(), admin.id).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Update an event
#[utoipa::path(
    put,
    path = "/v1/admin/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventSummary),
        (status = 400, description = "Rejected draft"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_event(
    State(state): State<EventsState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<EventSummary>, ApiError> {
    let event = state.service.update(id, req.into_draft()).await?;
    Ok(Json(event))
}

/// Reopen an event for booking
#[utoipa::path(
    patch,
    path = "/v1/admin/events/{id}/activate",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event activated", body = EventSummary),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn activate_event(
    State(state): State<EventsState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EventSummary>, ApiError> {
    let event = state.service.set_active(id, true).await?;
    Ok(Json(event))
}

/// Close an event to new bookings; existing bookings are kept
#[utoipa::path(
    patch,
    path = "/v1/admin/events/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event deactivated", body = EventSummary),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn deactivate_event(
    State(state): State<EventsState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EventSummary>, ApiError> {
    let event = state.service.set_active(id, false).await?;
    Ok(Json(event))
}

/// Roster for an event: confirmed seats, then the waitlist in promotion order
#[utoipa::path(
    get,
    path = "/v1/admin/events/{id}/bookings",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Bookings for the event", body = ListResponse<EventBooking>),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_event_bookings(
    State(state): State<EventsState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ListResponse<EventBooking>>, ApiError> {
    let bookings = state.service.bookings(id).await?;
    Ok(Json(ListResponse::new(bookings)))
}

pub fn routes(state: EventsState) -> Router {
    Router::new()
        .route("/v1/events", get(list_events))
        .route("/v1/admin/events", post(create_event))
        .route("/v1/admin/events/:id", put(update_event))
        .route("/v1/admin/events/:id/activate", patch(activate_event))
        .route("/v1/admin/events/:id/deactivate", patch(deactivate_event))
        .route("/v1/admin/events/:id/bookings", get(list_event_bookings))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let req: CreateEventRequest = serde_json::from_str(
            r#"{
                "title": "Quarterly Review",
                "location": "Auditorium",
                "starts_at": "2030-06-01T09:00:00Z",
                "max_seats": 40
            }"#,
        )
        .unwrap();
        let draft = req.into_draft();
        assert_eq!(draft.allowed_department, Department::All);
        assert_eq!(draft.description, "");
        assert_eq!(draft.max_seats, 40);
    }

    #[test]
    fn test_department_restriction_parses() {
        let req: UpdateEventRequest = serde_json::from_str(
            r#"{
                "title": "Sales Kickoff",
                "location": "HQ",
                "starts_at": "2030-02-01T10:00:00Z",
                "max_seats": 15,
                "allowed_department": "sales"
            }"#,
        )
        .unwrap();
        assert_eq!(req.allowed_department, Department::Sales);
    }
}
