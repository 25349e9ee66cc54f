use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    services::{jobs::JobEvent, welcome::SignUpEvent},
    AppState,
};

async fn enqueue(state: &AppState, event: JobEvent) -> Response {
    let job = event.name();

    if state.jobs.fire(event).await {
        (
            StatusCode::ACCEPTED,
            Json(json!({ "success": true, "job": job })),
        )
            .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "success": false, "job": job, "error": "Job runner is not available" })),
        )
            .into_response()
    }
}

// POST /api/jobs/watchlist-range
pub async fn post_watchlist_range(State(state): State<AppState>) -> Response {
    enqueue(&state, JobEvent::WatchlistRange).await
}

// POST /api/jobs/daily-news
pub async fn post_daily_news(State(state): State<AppState>) -> Response {
    enqueue(&state, JobEvent::DailyNews).await
}

// POST /api/events/user-created
pub async fn post_user_created(
    State(state): State<AppState>,
    payload: Result<Json<SignUpEvent>, JsonRejection>,
) -> Response {
    let event = match payload {
        Ok(Json(ev)) => ev,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": e.body_text() })),
            )
                .into_response();
        }
    };

    if event.email.trim().is_empty() || event.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "email and name are required" })),
        )
            .into_response();
    }

    enqueue(&state, JobEvent::UserCreated(event)).await
}
