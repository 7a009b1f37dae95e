use axum::{Router, routing::get};
use util::state::AppState;

pub mod get;

use get::get_machines;

pub fn machine_routes() -> Router<AppState> {
    Router::new().route("/", get(get_machines))
}
