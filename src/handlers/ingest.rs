//! Telemetry ingestion handler

use axum::{extract::State, Json};
use validator::Validate;

use crate::{AppState, AppError, AppResult};
use crate::detector::{self, SampleFlags, StreakDecision, WINDOW_LEN};
use crate::middleware::auth::DeviceContext;
use crate::models::{Cradle, IngestResponse, IngestSample, Sample};
use crate::notify;

/// Ingest one telemetry sample from a device
///
/// The sample insert is the only strict operation: a duplicate timestamp is
/// a 409, any other insert failure fails the request. Streak evaluation and
/// the notification fan-out run after the insert and are best-effort.
pub async fn log(
    State(state): State<AppState>,
    device: DeviceContext,
    Json(req): Json<IngestSample>,
) -> AppResult<Json<IngestResponse>> {
    req.validate().map_err(AppError::from)?;

    // Serialize ingests per cradle so the window read below always sees the
    // row inserted here and never a concurrent sibling's half-finished run.
    let _guard = state.locks.acquire(device.cradle_id).await;

    let sample = Sample::insert(&state.pool, device.cradle_id, req).await?;

    if sample.anomaly_overall {
        if let Err(e) = evaluate_streak(&state, &device, &sample).await {
            tracing::warn!(
                "Streak evaluation failed for cradle {}: {}",
                device.cradle_id,
                e
            );
        }
    }

    Ok(Json(IngestResponse { status: "ok" }))
}

/// Run the streak detector over the fresh window and dispatch on Fire.
async fn evaluate_streak(
    state: &AppState,
    device: &DeviceContext,
    newest: &Sample,
) -> Result<(), sqlx::Error> {
    let window = Sample::recent_window(&state.pool, device.cradle_id, WINDOW_LEN as i64).await?;
    debug_assert_eq!(window.first().map(|s| s.id), Some(newest.id));

    let flags: Vec<SampleFlags> = window.iter().map(SampleFlags::from).collect();

    if let StreakDecision::Fire { issues } = detector::evaluate(&flags) {
        match Cradle::find_by_id(&state.pool, device.cradle_id).await? {
            Some(cradle) => notify::dispatch_anomaly_alert(state, &cradle, &issues).await,
            None => tracing::warn!("Cradle {} vanished during streak dispatch", device.cradle_id),
        }
    }
    Ok(())
}
