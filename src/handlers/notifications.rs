//! Notification feed and push stream handlers

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, AppResult};
use crate::models::{Notification, NotificationFeedItem};

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub user_id: Uuid,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub user_id: Uuid,
}

/// Recent notifications for a user
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> AppResult<Json<Vec<NotificationFeedItem>>> {
    let limit = query.limit.clamp(1, 200);
    let notifications = Notification::list_recent(&state.pool, query.user_id, limit).await?;
    Ok(Json(notifications))
}

/// Stream a user's push events via SSE
pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.hub.subscribe(query.user_id);

    let stream = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(event) => {
                let json = serde_json::to_string(&event).unwrap_or_default();
                let sse_event = Event::default().data(json);
                Some((Ok(sse_event), rx))
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                // Client lagged behind, continue
                Some((Ok(Event::default().comment("lagged")), rx))
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => None,
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
