// Notification sink trait
//
// One method per notification kind. Implementations deliver however they
// like (SMTP in seatwise-api); callers treat every send as fire-and-forget
// and log failures instead of propagating them.

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::event::Event;
use crate::user::User;

/// Outbound notification sink.
///
/// Senders must never rely on delivery: a returned error is logged by the
/// caller and the triggering operation still succeeds.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A new employee account was provisioned with a temporary password.
    async fn employee_created(&self, user: &User, temp_password: &str) -> Result<(), NotifyError>;

    /// The user's booking got a confirmed seat.
    async fn booking_confirmed(&self, user: &User, event: &Event) -> Result<(), NotifyError>;

    /// The event was full; the user's booking joined the waitlist.
    async fn booking_waitlisted(&self, user: &User, event: &Event) -> Result<(), NotifyError>;

    /// The user cancelled their booking.
    async fn booking_cancelled(&self, user: &User, event: &Event) -> Result<(), NotifyError>;

    /// A seat opened up and the user's waitlisted booking is now confirmed.
    async fn promoted_from_waitlist(&self, user: &User, event: &Event)
        -> Result<(), NotifyError>;
}

/// Sink that drops every notification, logging at debug. Used when SMTP is
/// not configured and in tests that don't inspect deliveries.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn employee_created(&self, user: &User, _temp_password: &str) -> Result<(), NotifyError> {
        tracing::debug!(email = %user.email, "employee_created notification dropped (no sink configured)");
        Ok(())
    }

    async fn booking_confirmed(&self, user: &User, event: &Event) -> Result<(), NotifyError> {
        tracing::debug!(email = %user.email, event = %event.title, "booking_confirmed notification dropped (no sink configured)");
        Ok(())
    }

    async fn booking_waitlisted(&self, user: &User, event: &Event) -> Result<(), NotifyError> {
        tracing::debug!(email = %user.email, event = %event.title, "booking_waitlisted notification dropped (no sink configured)");
        Ok(())
    }

    async fn booking_cancelled(&self, user: &User, event: &Event) -> Result<(), NotifyError> {
        tracing::debug!(email = %user.email, event = %event.title, "booking_cancelled notification dropped (no sink configured)");
        Ok(())
    }

    async fn promoted_from_waitlist(
        &self,
        user: &User,
        event: &Event,
    ) -> Result<(), NotifyError> {
        tracing::debug!(email = %user.email, event = %event.title, "promoted_from_waitlist notification dropped (no sink configured)");
        Ok(())
    }
}
