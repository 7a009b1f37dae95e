use axum::{
    Router,
    routing::{get, patch, post},
};
use util::state::AppState;

pub mod get;
pub mod patch;
pub mod post;

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get::list_sessions))
        .route("/{session_id}", patch(patch::update_session))
        .route("/{session_id}/close", post(post::close_session))
}
