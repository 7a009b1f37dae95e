use axum::{Router, routing::delete};
use util::state::AppState;

pub mod delete;

use delete::reset_database;

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/reset", delete(reset_database))
}
