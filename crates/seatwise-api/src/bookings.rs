// Booking routes: the employee-facing side of the booking engine
//
// Booking a full event is not a failure; the engine returns a waitlisted
// booking and the 201 body carries the status.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use seatwise_core::{Booking, BookingEngine, BookingStatus, MyBooking};
use seatwise_storage::PgBookingStore;

use crate::auth::{AuthState, EmployeeUser, FromRef};
use crate::common::{ApiError, ListResponse};

/// State for booking routes
#[derive(Clone)]
pub struct BookingsState {
    pub engine: Arc<BookingEngine<PgBookingStore>>,
    pub auth: AuthState,
}

impl FromRef<BookingsState> for AuthState {
    fn from_ref(state: &BookingsState) -> Self {
        state.auth.clone()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancelResponse {
    pub booking_id: Uuid,
    /// Status the booking held when it was cancelled
    pub status: BookingStatus,
    /// Whether a waitlisted booking was promoted into the freed seat
    pub promoted_from_waitlist: bool,
}

/// Book a seat on an event
#[utoipa::path(
    post,
    path = "/v1/bookings/{event_id}",
    params(("event_id" = Uuid, Path, description = "Event to book")),
    responses(
        (status = 201, description = "Booking created; status is confirmed or waitlisted", body = Booking),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Already booked, or event closed"),
        (status = 403, description = "Department restriction")
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<BookingsState>,
    EmployeeUser(user): EmployeeUser,
    Path(event_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let booking = state.engine.book(event_id, user.id).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Cancel a booking
#[utoipa::path(
    delete,
    path = "/v1/bookings/{event_id}",
    params(("event_id" = Uuid, Path, description = "Event the booking is on")),
    responses(
        (status = 200, description = "Booking cancelled", body = CancelResponse),
        (status = 404, description = "No booking on this event")
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn cancel_booking(
    State(state): State<BookingsState>,
    EmployeeUser(user): EmployeeUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<CancelResponse>, ApiError> {
    let outcome = state.engine.cancel(event_id, user.id).await?;
    Ok(Json(CancelResponse {
        booking_id: outcome.cancelled.id,
        status: outcome.cancelled.status,
        promoted_from_waitlist: outcome.promoted.is_some(),
    }))
}

/// The caller's bookings across all events
#[utoipa::path(
    get,
    path = "/v1/bookings/my",
    responses(
        (status = 200, description = "Bookings with event details", body = ListResponse<MyBooking>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn my_bookings(
    State(state): State<BookingsState>,
    EmployeeUser(user): EmployeeUser,
) -> Result<Json<ListResponse<MyBooking>>, ApiError> {
    let bookings = state.engine.my_bookings(user.id).await?;
    Ok(Json(ListResponse::new(bookings)))
}

pub fn routes(state: BookingsState) -> Router {
    Router::new()
        .route("/v1/bookings/my", get(my_bookings))
        .route(
            "/v1/bookings/:event_id",
            post(create_booking).delete(cancel_booking),
        )
        .with_state(state)
}
