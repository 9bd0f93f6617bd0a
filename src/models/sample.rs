//! Telemetry sample model

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

use crate::detector::SampleFlags;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sample {
    pub id: i64,
    pub cradle_id: Uuid,
    pub boot_id: Option<String>,
    pub uptime_seconds: Option<i64>,
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub sound_level: Option<f32>,
    pub motion_state: Option<String>,
    pub acc_x: Option<f32>,
    pub acc_y: Option<f32>,
    pub acc_z: Option<f32>,
    pub confidence_idle: Option<f32>,
    pub confidence_normal: Option<f32>,
    pub confidence_shake: Option<f32>,
    pub confidence_tilt: Option<f32>,
    pub anomaly_temperature: bool,
    pub anomaly_humidity: bool,
    pub anomaly_motion: bool,
    pub anomaly_noise: bool,
    pub anomaly_overall: bool,
    pub created_at: DateTime<Utc>,
}

/// Ingest payload as sent by the device firmware.
#[derive(Debug, Deserialize, Validate)]
pub struct IngestSample {
    pub boot_id: Option<String>,
    pub uptime_seconds: Option<i64>,

    #[validate(range(min = -40.0, max = 85.0))]
    pub temperature: Option<f32>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: Option<f32>,

    #[validate(range(min = 0.0, max = 200.0))]
    pub sound_level: Option<f32>,

    pub motion_state: Option<String>,

    pub acc_x: Option<f32>,
    pub acc_y: Option<f32>,
    pub acc_z: Option<f32>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub confidence_idle: Option<f32>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub confidence_normal: Option<f32>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub confidence_shake: Option<f32>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub confidence_tilt: Option<f32>,

    #[serde(default)]
    pub anomaly_temperature: bool,
    #[serde(default)]
    pub anomaly_humidity: bool,
    #[serde(default)]
    pub anomaly_motion: bool,
    #[serde(default)]
    pub anomaly_noise: bool,
    #[serde(default)]
    pub anomaly_overall: bool,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
}

impl Sample {
    pub async fn insert(
        pool: &PgPool,
        cradle_id: Uuid,
        data: IngestSample,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Sample>(
            r#"
            INSERT INTO cradle_samples (
                cradle_id, boot_id, uptime_seconds,
                temperature, humidity, sound_level,
                motion_state,
                acc_x, acc_y, acc_z,
                confidence_idle, confidence_normal, confidence_shake, confidence_tilt,
                anomaly_temperature, anomaly_humidity,
                anomaly_motion, anomaly_noise, anomaly_overall
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19
            )
            RETURNING *
            "#
        )
        .bind(cradle_id)
        .bind(&data.boot_id)
        .bind(data.uptime_seconds)
        .bind(data.temperature)
        .bind(data.humidity)
        .bind(data.sound_level)
        .bind(&data.motion_state)
        .bind(data.acc_x)
        .bind(data.acc_y)
        .bind(data.acc_z)
        .bind(data.confidence_idle)
        .bind(data.confidence_normal)
        .bind(data.confidence_shake)
        .bind(data.confidence_tilt)
        .bind(data.anomaly_temperature)
        .bind(data.anomaly_humidity)
        .bind(data.anomaly_motion)
        .bind(data.anomaly_noise)
        .bind(data.anomaly_overall)
        .fetch_one(pool)
        .await
    }

    /// Most recent samples for a cradle, newest first.
    ///
    /// With `limit = detector::WINDOW_LEN` this is the detector's evaluation
    /// window: the just-inserted sample comes back as element 0.
    pub async fn recent_window(
        pool: &PgPool,
        cradle_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Sample>(
            r#"
            SELECT * FROM cradle_samples
            WHERE cradle_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        )
        .bind(cradle_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn latest(pool: &PgPool, cradle_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Sample>(
            r#"
            SELECT * FROM cradle_samples
            WHERE cradle_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        )
        .bind(cradle_id)
        .fetch_optional(pool)
        .await
    }
}

impl From<&Sample> for SampleFlags {
    fn from(s: &Sample) -> Self {
        SampleFlags {
            overall: s.anomaly_overall,
            temperature: s.anomaly_temperature,
            humidity: s.anomaly_humidity,
            motion: s.anomaly_motion,
            noise: s.anomaly_noise,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn base_payload() -> IngestSample {
        IngestSample {
            boot_id: Some("boot-1".to_string()),
            uptime_seconds: Some(120),
            temperature: Some(25.0),
            humidity: Some(50.0),
            sound_level: Some(40.0),
            motion_state: Some("Normal".to_string()),
            acc_x: Some(0.0),
            acc_y: Some(0.0),
            acc_z: Some(1.0),
            confidence_idle: Some(0.0),
            confidence_normal: Some(100.0),
            confidence_shake: Some(0.0),
            confidence_tilt: Some(0.0),
            anomaly_temperature: false,
            anomaly_humidity: false,
            anomaly_motion: false,
            anomaly_noise: false,
            anomaly_overall: false,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(base_payload().validate().is_ok());
    }

    #[test]
    fn out_of_range_temperature_rejected() {
        let mut p = base_payload();
        p.temperature = Some(240.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn out_of_range_confidence_rejected() {
        let mut p = base_payload();
        p.confidence_shake = Some(150.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn missing_optional_fields_pass() {
        let p = IngestSample {
            boot_id: None,
            uptime_seconds: None,
            temperature: None,
            humidity: None,
            sound_level: None,
            motion_state: None,
            acc_x: None,
            acc_y: None,
            acc_z: None,
            confidence_idle: None,
            confidence_normal: None,
            confidence_shake: None,
            confidence_tilt: None,
            anomaly_temperature: false,
            anomaly_humidity: false,
            anomaly_motion: false,
            anomaly_noise: false,
            anomaly_overall: true,
        };
        assert!(p.validate().is_ok());
    }
}
