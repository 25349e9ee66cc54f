use axum::{Router, routing::post};
use crate::{AppState, controllers::jobs_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/jobs/watchlist-range", post(jobs_controller::post_watchlist_range))
        .route("/api/jobs/daily-news", post(jobs_controller::post_daily_news))
        .route("/api/events/user-created", post(jobs_controller::post_user_created))
}
