use axum::{Router, routing::get};
use util::state::AppState;

pub mod feed;
pub mod topics;

use feed::fleet_feed_handler;

pub fn ws_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/fleet", get(fleet_feed_handler))
        .with_state(app_state)
}
