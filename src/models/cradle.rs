//! Cradle (monitored unit) model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cradle {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cradle_name: String,
    pub baby_name: Option<String>,
    pub location: Option<String>,
    pub alert_email: Option<String>,
    #[serde(skip_serializing)]
    pub device_key_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dashboard row: cradle plus the overall flag of its latest sample.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CradleSummary {
    pub id: Uuid,
    pub cradle_name: String,
    pub baby_name: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub anomaly_overall: Option<bool>,
}

impl Cradle {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Cradle>("SELECT * FROM cradles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_device_hash(
        pool: &PgPool,
        device_key_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Cradle>("SELECT * FROM cradles WHERE device_key_hash = $1")
            .bind(device_key_hash)
            .fetch_optional(pool)
            .await
    }

    /// List a user's cradles with the latest overall anomaly flag of each.
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<CradleSummary>, sqlx::Error> {
        sqlx::query_as::<_, CradleSummary>(
            r#"
            SELECT c.id, c.cradle_name, c.baby_name, c.location, c.created_at,
                   d.anomaly_overall
            FROM cradles c
            LEFT JOIN LATERAL (
                SELECT anomaly_overall
                FROM cradle_samples
                WHERE cradle_id = c.id
                ORDER BY created_at DESC
                LIMIT 1
            ) d ON true
            WHERE c.user_id = $1
            ORDER BY c.created_at ASC
            "#
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
