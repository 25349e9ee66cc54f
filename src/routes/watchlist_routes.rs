use axum::{Router, routing::get};
use crate::{AppState, controllers::watchlist_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/watchlist",
            get(watchlist_controller::get_watchlist).post(watchlist_controller::post_add_watchlist),
        )
        .route(
            "/api/watchlist/:symbol",
            get(watchlist_controller::get_watchlist_status).delete(watchlist_controller::delete_watchlist),
        )
}
