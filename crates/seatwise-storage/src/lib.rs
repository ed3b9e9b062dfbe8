// Postgres storage layer with sqlx
//
// This crate provides:
// - Database: pool handle with user/event/booking queries used by the API
// - PgBookingStore: the transactional store the booking engine runs on,
//   taking a row lock on the event before any seat accounting

pub mod booking_store;
pub mod models;
pub mod repositories;

pub use booking_store::{PgBookingStore, PgBookingTx};
pub use models::*;
pub use repositories::*;
