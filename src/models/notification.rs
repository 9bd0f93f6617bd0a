//! Notification model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Notification category for anomaly streak alerts.
pub const KIND_ANOMALY: &str = "ANOMALY";

/// Alert key for the overall-anomaly streak rule.
pub const ALERT_KEY_OVERALL: &str = "OVERALL";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cradle_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub alert_key: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Feed row: notification plus the cradle it belongs to.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NotificationFeedItem {
    pub id: Uuid,
    pub cradle_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub alert_key: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub cradle_name: String,
}

impl Notification {
    /// Insert an anomaly notification for a cradle owner.
    pub async fn create_anomaly(
        pool: &PgPool,
        user_id: Uuid,
        cradle_id: Uuid,
        title: &str,
        message: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, cradle_id, type, alert_key, title, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#
        )
        .bind(user_id)
        .bind(cradle_id)
        .bind(KIND_ANOMALY)
        .bind(ALERT_KEY_OVERALL)
        .bind(title)
        .bind(message)
        .fetch_one(pool)
        .await
    }

    /// Recent notifications for a user, newest first.
    pub async fn list_recent(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<NotificationFeedItem>, sqlx::Error> {
        sqlx::query_as::<_, NotificationFeedItem>(
            r#"
            SELECT n.id, n.cradle_id, n.type, n.alert_key, n.title, n.message,
                   n.is_read, n.created_at, c.cradle_name
            FROM notifications n
            JOIN cradles c ON n.cradle_id = c.id
            WHERE n.user_id = $1
            ORDER BY n.created_at DESC
            LIMIT $2
            "#
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
