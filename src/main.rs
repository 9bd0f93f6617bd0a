//! CradleWatch Cloud Backend Server
//!
//! Telemetry ingestion and anomaly alerting for cradle monitors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   CRADLEWATCH CLOUD                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────┐  ┌──────────────────────┐ │
//! │  │  Ingest   │  │  Streak      │  │  Notification        │ │
//! │  │  API      │  │  Detector    │  │  Fan-out             │ │
//! │  │  (Axum)   │  │  (pure)      │  │  (DB / SSE / Email)  │ │
//! │  └─────┬─────┘  └──────┬───────┘  └──────────┬───────────┘ │
//! │        └───────────────┼─────────────────────┘              │
//! │                        ▼                                    │
//! │                 ┌─────────────┐                             │
//! │                 │ PostgreSQL  │                             │
//! │                 └─────────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod detector;
mod error;
mod handlers;
mod locks;
mod mailer;
mod middleware;
mod models;
mod notify;
mod push;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "cradlewatch_cloud=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("CradleWatch Cloud Server starting...");
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));
    if config.email_webhook_url.is_none() {
        tracing::warn!("EMAIL_WEBHOOK_URL not set, anomaly emails disabled");
    }

    // Initialize database pool
    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    // Build application state
    let state = AppState {
        pool,
        mailer: Arc::new(mailer::Mailer::new(config.email_webhook_url.clone())),
        hub: Arc::new(push::NotificationHub::new()),
        locks: Arc::new(locks::UnitLocks::new()),
        config,
    };

    // Build router
    let app = create_router(state.clone());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    pub mailer: Arc<mailer::Mailer>,
    pub hub: Arc<push::NotificationHub>,
    pub locks: Arc<locks::UnitLocks>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check));

    // Device routes (device key auth)
    let device_routes = Router::new()
        .route("/api/v1/ingest/log", post(handlers::ingest::log))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_device_auth
        ));

    // Dashboard read routes (polling + push surface)
    let read_routes = Router::new()
        // Cradles
        .route("/api/v1/cradles", get(handlers::cradles::list))
        .route("/api/v1/cradles/:id/status", get(handlers::cradles::status))
        .route("/api/v1/cradles/:id/history", get(handlers::cradles::history))

        // Notifications
        .route("/api/v1/notifications", get(handlers::notifications::list))
        .route("/api/v1/notifications/stream", get(handlers::notifications::stream));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .merge(device_routes)
        .merge(read_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
