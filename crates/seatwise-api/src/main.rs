// Seatwise API server
// Decision: JWT-only auth with an env-seeded admin account; employees are
// provisioned by admins, never self-registered

mod auth;
mod bookings;
mod common;
mod email;
mod employees;
mod events;
mod services;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use seatwise_core::{
    Booking, BookingEngine, BookingStatus, Department, EventBooking, EventSummary, MyBooking,
    NoopNotifier, Notifier, Role,
};
use seatwise_storage::{Database, PgBookingStore};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    email_enabled: bool,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        email_enabled: state.email_enabled,
    })
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    email_enabled: bool,
}

/// Registers the bearer token scheme referenced by the protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::routes::login,
        auth::routes::me,
        auth::routes::change_password,
        events::list_events,
        events::create_event,
        events::update_event,
        events::activate_event,
        events::deactivate_event,
        events::list_event_bookings,
        bookings::create_booking,
        bookings::cancel_booking,
        bookings::my_bookings,
        employees::create_employee,
        employees::list_employees,
    ),
    components(
        schemas(
            Role, Department,
            Booking, BookingStatus, MyBooking,
            EventSummary, EventBooking,
            auth::routes::LoginRequest,
            auth::routes::LoginResponse,
            auth::routes::UserProfile,
            auth::routes::ChangePasswordRequest,
            events::CreateEventRequest,
            events::UpdateEventRequest,
            bookings::CancelResponse,
            employees::CreateEmployeeRequest,
            employees::CreateEmployeeResponse,
            employees::EmployeeResponse,
            common::ErrorResponse,
            common::ListResponse<EventSummary>,
            common::ListResponse<EventBooking>,
            common::ListResponse<MyBooking>,
            common::ListResponse<employees::EmployeeResponse>,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login and account endpoints"),
        (name = "events", description = "Event browsing endpoints"),
        (name = "bookings", description = "Seat booking endpoints"),
        (name = "admin", description = "Event and employee administration")
    ),
    info(
        title = "Seatwise API",
        version = "0.1.0",
        description = "Internal event booking with capacity limits and FIFO waitlists",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatwise_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    tracing::info!("seatwise-api starting...");

    // Initialize database
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable required")?;
    let db = Database::from_url(&database_url)
        .await
        .context("Failed to connect to database")?;
    db.migrate()
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Connected to database, migrations applied");

    // Load authentication configuration and seed the admin account
    let auth_config = auth::AuthConfig::from_env();
    auth::ensure_admin_user(&db, &auth_config)
        .await
        .context("Failed to seed admin account")?;

    // Email notifications degrade gracefully to the no-op sink
    let (notifier, email_enabled): (Arc<dyn Notifier>, bool) = match email::EmailConfig::from_env()
    {
        Some(config) => match email::EmailNotifier::new(config.clone()) {
            Ok(n) => {
                tracing::info!(host = %config.host, port = config.port, "SMTP notifications enabled");
                (Arc::new(n), true)
            }
            Err(e) => {
                tracing::warn!("SMTP transport setup failed: {e:#}. Email notifications disabled.");
                (Arc::new(NoopNotifier), false)
            }
        },
        None => {
            tracing::info!("SMTP_HOST not set, email notifications disabled");
            (Arc::new(NoopNotifier), false)
        }
    };

    // The booking engine owns the transactional store
    let engine = Arc::new(BookingEngine::new(
        PgBookingStore::new(db.clone()),
        notifier.clone(),
    ));

    // Create module-specific states
    let db = Arc::new(db);
    let auth_state = auth::AuthState::new(&auth_config);
    let auth_api_state = auth::AuthApiState {
        db: db.clone(),
        auth: auth_state.clone(),
    };
    let events_state = events::EventsState {
        service: Arc::new(services::EventService::new(db.clone())),
        auth: auth_state.clone(),
    };
    let bookings_state = bookings::BookingsState {
        engine,
        auth: auth_state.clone(),
    };
    let employees_state = employees::EmployeesState {
        db: db.clone(),
        auth: auth_state,
        notifier,
    };
    let health_state = HealthState { email_enabled };

    // Load API prefix from environment (default: empty)
    // Example: API_PREFIX="/api" results in routes like /api/v1/events
    let api_prefix = std::env::var("API_PREFIX").unwrap_or_default();
    if !api_prefix.is_empty() {
        tracing::info!(prefix = %api_prefix, "API prefix configured");
    }

    // Load CORS allowed origins from environment (optional)
    // Only needed when the SPA is served from a different origin than the API
    // Example: CORS_ALLOWED_ORIGINS="https://seatwise.example.com"
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    // Build API routes
    let api_routes = Router::new()
        .merge(events::routes(events_state))
        .merge(bookings::routes(bookings_state))
        .merge(employees::routes(employees_state));

    // Build main router with health, auth (not prefixed), and prefixed API routes
    let mut app = Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(auth::routes::routes(auth_api_state));

    // Apply API prefix if configured
    app = app.merge(build_router_with_prefix(api_routes, &api_prefix));

    // Add Swagger UI
    let app =
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                    header::CACHE_CONTROL,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Build router with optional API prefix (extracted for testing)
fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
