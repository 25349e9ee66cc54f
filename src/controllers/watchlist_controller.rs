use axum::{
    Json,
    extract::{Extension, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    models::{CurrentUser, NewWatchlistEntry, WatchlistEntry},
    services::watchlist_service::{self, ActionResult},
    AppState,
};

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "error": "Unauthorized" })),
    )
        .into_response()
}

fn entry_json(e: &WatchlistEntry) -> serde_json::Value {
    json!({
        "id": e.id.map(|id| id.to_hex()),
        "symbol": e.symbol,
        "company": e.company,
        "minValue": e.min_value,
        "maxValue": e.max_value,
        "addedAt": e.added_at.to_rfc3339(),
    })
}

fn action_json<T>(res: ActionResult<T>, data: impl FnOnce(T) -> serde_json::Value) -> Response {
    let body = match (res.success, res.data) {
        (true, Some(d)) => json!({ "success": true, "data": data(d) }),
        _ => json!({
            "success": false,
            "error": res.error.unwrap_or_else(|| "Unknown error".to_string()),
        }),
    };

    (StatusCode::OK, Json(body)).into_response()
}

// GET /api/watchlist
pub async fn get_watchlist(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    let res = watchlist_service::list_watchlist(state.store.as_ref(), &u.id.to_hex()).await;
    action_json(res, |items| {
        serde_json::Value::Array(items.iter().map(entry_json).collect())
    })
}

// GET /api/watchlist/:symbol
pub async fn get_watchlist_status(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    let sym = watchlist_service::normalize_symbol(&symbol);
    let found = watchlist_service::is_in_watchlist(state.store.as_ref(), &u.id.to_hex(), &sym).await;

    (
        StatusCode::OK,
        Json(json!({ "symbol": sym, "inWatchlist": found })),
    )
        .into_response()
}

// POST /api/watchlist
pub async fn post_add_watchlist(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    payload: Result<Json<NewWatchlistEntry>, JsonRejection>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    let input = match payload {
        Ok(Json(input)) => input,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": e.body_text() })),
            )
                .into_response();
        }
    };

    let res = watchlist_service::add_to_watchlist(state.store.as_ref(), &u.id.to_hex(), &input).await;
    action_json(res, |entry| entry_json(&entry))
}

// DELETE /api/watchlist/:symbol
pub async fn delete_watchlist(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    let res = watchlist_service::remove_from_watchlist(state.store.as_ref(), &u.id.to_hex(), &symbol).await;
    action_json(res, |removed| json!({ "removed": removed }))
}
