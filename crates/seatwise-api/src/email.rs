// SMTP notification sink backed by lettre
//
// Implements the Notifier trait over an async SMTP transport. When SMTP_HOST
// is not configured the service runs with the no-op sink instead, so email
// is always optional.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use seatwise_core::{Event, NotifyError, Notifier, User};

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl EmailConfig {
    /// Read SMTP settings from the environment. Returns None when SMTP_HOST
    /// is absent, which disables email delivery entirely.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok().filter(|h| !h.is_empty())?;
        Some(Self {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: std::env::var("SMTP_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@seatwise.local".to_string()),
            from_name: std::env::var("SMTP_FROM_NAME")
                .unwrap_or_else(|_| "Seatwise Events".to_string()),
        })
    }
}

pub struct EmailNotifier {
    config: EmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> anyhow::Result<Self> {
        // STARTTLS on the submission port; credentials are optional for
        // dev relays like Mailpit
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }
        let mailer = builder.build();
        Ok(Self { config, mailer })
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.config.from_name, self.config.from_email)
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| NotifyError::new(format!("Invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| NotifyError::new(format!("Invalid recipient address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| NotifyError::new(format!("Failed to build email: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::new(format!("SMTP send failed: {e}")))?;
        tracing::debug!(to, subject, "notification email sent");
        Ok(())
    }
}

fn event_details(event: &Event) -> String {
    format!(
        "When:  {}\nWhere: {}",
        event.starts_at.format("%Y-%m-%d %H:%M UTC"),
        event.location
    )
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn employee_created(&self, user: &User, temp_password: &str) -> Result<(), NotifyError> {
        let body = format!(
            "Hi {},\n\nYour Seatwise account is ready.\n\n\
             Login email:        {}\n\
             Temporary password: {}\n\n\
             You will be asked to pick a new password on first login.\n",
            user.name, user.email, temp_password
        );
        self.send(&user.email, "Welcome to Seatwise", body).await
    }

    async fn booking_confirmed(&self, user: &User, event: &Event) -> Result<(), NotifyError> {
        let body = format!(
            "Hi {},\n\nYour booking for '{}' is CONFIRMED.\n\n{}\n",
            user.name,
            event.title,
            event_details(event)
        );
        self.send(
            &user.email,
            &format!("Booking confirmed: {}", event.title),
            body,
        )
        .await
    }

    async fn booking_waitlisted(&self, user: &User, event: &Event) -> Result<(), NotifyError> {
        let body = format!(
            "Hi {},\n\nThe event '{}' is full. You are on the WAITLIST.\n\n\
             If a seat frees up, your booking is confirmed automatically and \
             you will get another email.\n\n{}\n",
            user.name,
            event.title,
            event_details(event)
        );
        self.send(&user.email, &format!("Waitlisted: {}", event.title), body)
            .await
    }

    async fn booking_cancelled(&self, user: &User, event: &Event) -> Result<(), NotifyError> {
        let body = format!(
            "Hi {},\n\nYour booking for '{}' has been cancelled.\n",
            user.name, event.title
        );
        self.send(
            &user.email,
            &format!("Booking cancelled: {}", event.title),
            body,
        )
        .await
    }

    async fn promoted_from_waitlist(&self, user: &User, event: &Event) -> Result<(), NotifyError> {
        let body = format!(
            "Hi {},\n\nGood news! A seat opened up and your booking for '{}' \
             is now CONFIRMED.\n\n{}\n",
            user.name,
            event.title,
            event_details(event)
        );
        self.send(&user.email, &format!("You're in: {}", event.title), body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header_format() {
        let notifier = EmailNotifier::new(EmailConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_email: "noreply@seatwise.local".to_string(),
            from_name: "Seatwise Events".to_string(),
        })
        .unwrap();
        assert_eq!(
            notifier.from_header(),
            "Seatwise Events <noreply@seatwise.local>"
        );
    }
}
