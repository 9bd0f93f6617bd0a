//! Cradle read handlers

use axum::{extract::{State, Path, Query}, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, AppResult, AppError};
use crate::detector::{self, SampleFlags, StreakState, WINDOW_LEN};
use crate::models::{Cradle, CradleSummary, Sample};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Cradle metadata, its latest sample, and the derived streak state.
#[derive(Debug, Serialize)]
pub struct CradleStatus {
    pub id: Uuid,
    pub cradle_name: String,
    pub baby_name: Option<String>,
    pub location: Option<String>,
    pub streak: StreakState,
    pub latest: Option<Sample>,
}

/// List a user's cradles with their latest anomaly flag
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<CradleSummary>>> {
    let cradles = Cradle::list_by_user(&state.pool, query.user_id).await?;
    Ok(Json(cradles))
}

/// Live status for one cradle
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CradleStatus>> {
    let cradle = Cradle::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cradle not found".to_string()))?;

    let window = Sample::recent_window(&state.pool, id, WINDOW_LEN as i64).await?;
    let flags: Vec<SampleFlags> = window.iter().map(SampleFlags::from).collect();

    Ok(Json(CradleStatus {
        id: cradle.id,
        cradle_name: cradle.cradle_name,
        baby_name: cradle.baby_name,
        location: cradle.location,
        streak: detector::streak_state(&flags),
        latest: window.into_iter().next(),
    }))
}

/// Recent samples for one cradle, newest first
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<Sample>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    let cradle = Cradle::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cradle not found".to_string()))?;

    let samples = Sample::recent_window(&state.pool, cradle.id, limit).await?;
    Ok(Json(samples))
}
