use axum::{Router, routing::post};
use util::state::AppState;

pub mod post;

use post::ingest_event;

pub fn event_routes() -> Router<AppState> {
    Router::new().route("/", post(ingest_event))
}
