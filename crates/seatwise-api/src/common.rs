// Common API types shared across route modules

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use seatwise_core::BookingError;

/// Standard error response body. `code` is a stable machine-readable
/// identifier; `error` is the human-readable message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
        }
    }
}

/// List response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }
}

/// Error type returned by every handler. Carries the HTTP status together
/// with the response body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(code, message),
        }
    }

    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn not_found(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    /// Details are logged server-side, never sent to the client.
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::EventNotFound(_) => Self::not_found("event_not_found", message),
            BookingError::UserNotFound(_) => Self::not_found("user_not_found", message),
            BookingError::BookingNotFound { .. } => Self::not_found("booking_not_found", message),
            BookingError::EventInactive(_) => Self::conflict("event_inactive", message),
            BookingError::EventAlreadyStarted(_) => {
                Self::conflict("event_already_started", message)
            }
            BookingError::AlreadyBooked { .. } => Self::conflict("already_booked", message),
            BookingError::DepartmentRestricted { .. } => {
                Self::new(StatusCode::FORBIDDEN, "department_restricted", message)
            }
            BookingError::PastEventDate => Self::bad_request("past_event_date", message),
            BookingError::NonPositiveSeats => Self::bad_request("non_positive_seats", message),
            BookingError::Conflict => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "conflict_retry",
                "Too many concurrent bookings, please retry",
            ),
            BookingError::Store(err) => {
                tracing::error!("Storage error: {err:#}");
                Self::internal()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal error: {err:#}");
        Self::internal()
    }
}
