//! Database module - PostgreSQL connection and migrations

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create tables if not exist
    sqlx::query(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Cradles (monitored units). Provisioned externally; user accounts live in
-- the separate auth service, so user_id carries no foreign key here.
CREATE TABLE IF NOT EXISTS cradles (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    cradle_name VARCHAR(255) NOT NULL,
    baby_name VARCHAR(255),
    location VARCHAR(255),
    alert_email VARCHAR(255),
    device_key_hash VARCHAR(64) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ DEFAULT NOW(),
    updated_at TIMESTAMPTZ DEFAULT NOW()
);

-- Telemetry samples. Immutable once written; read newest-first per cradle.
CREATE TABLE IF NOT EXISTS cradle_samples (
    id BIGSERIAL PRIMARY KEY,
    cradle_id UUID NOT NULL REFERENCES cradles(id) ON DELETE CASCADE,
    boot_id VARCHAR(64),
    uptime_seconds BIGINT,
    temperature REAL,
    humidity REAL,
    sound_level REAL,
    motion_state VARCHAR(32),
    acc_x REAL,
    acc_y REAL,
    acc_z REAL,
    confidence_idle REAL,
    confidence_normal REAL,
    confidence_shake REAL,
    confidence_tilt REAL,
    anomaly_temperature BOOLEAN NOT NULL DEFAULT FALSE,
    anomaly_humidity BOOLEAN NOT NULL DEFAULT FALSE,
    anomaly_motion BOOLEAN NOT NULL DEFAULT FALSE,
    anomaly_noise BOOLEAN NOT NULL DEFAULT FALSE,
    anomaly_overall BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (cradle_id, created_at)
);

-- Anomaly notifications. Written by the streak detector fan-out; the
-- read/unread lifecycle belongs to the notification-management service.
CREATE TABLE IF NOT EXISTS notifications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    cradle_id UUID NOT NULL REFERENCES cradles(id) ON DELETE CASCADE,
    type VARCHAR(32) NOT NULL DEFAULT 'ANOMALY',
    alert_key VARCHAR(32) NOT NULL DEFAULT 'OVERALL',
    title VARCHAR(255) NOT NULL,
    message TEXT NOT NULL,
    is_read BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_samples_cradle_created ON cradle_samples(cradle_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_cradles_user ON cradles(user_id);
CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_notifications_cradle ON notifications(cradle_id);
"#;
