//! HTTP route entry point for `/api/...`.
//!
//! Route groups include:
//! - `/health` → Liveness probe (public)
//! - `/events` → Client event ingestion (start/heartbeat/stop)
//! - `/machines` → Consolidated fleet view (reconciled on every read)
//! - `/sessions` → Session history, billing updates, explicit close
//! - `/admin` → Administrative wipe

use axum::Router;
use util::state::AppState;

pub mod admin;
pub mod events;
pub mod health;
pub mod machines;
pub mod sessions;

/// Builds the complete application router for all HTTP endpoints.
///
/// Mounts all core API routes under their respective base paths and binds
/// the shared `AppState`.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health::health_routes())
        .nest("/events", events::event_routes())
        .nest("/machines", machines::machine_routes())
        .nest("/sessions", sessions::session_routes())
        .nest("/admin", admin::admin_routes())
        .with_state(app_state)
}
