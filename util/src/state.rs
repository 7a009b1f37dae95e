//! Application state container shared across Axum route handlers and services.
//!
//! This struct holds shared resources such as the database connection, the
//! WebSocket manager, and the per-machine lock map. It is cheap to clone and is
//! passed into route handlers via Axum's `State<T>` extractor.

use crate::sync::KeyedLocks;
use crate::ws::WebSocketManager;
use sea_orm::DatabaseConnection;

/// Central application state shared across the server.
///
/// This includes:
/// - A cloned, thread-safe database connection for use with SeaORM.
/// - A global `WebSocketManager` for broadcasting snapshots to observers.
/// - A `KeyedLocks` map serializing presence transitions per machine.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    ws: WebSocketManager,
    locks: KeyedLocks,
}

impl AppState {
    /// Creates a new `AppState` with the given database connection and a fresh
    /// WebSocket manager and lock map.
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            ws: WebSocketManager::new(),
            locks: KeyedLocks::new(),
        }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns a shared reference to the internal `WebSocketManager`.
    pub fn ws(&self) -> &WebSocketManager {
        &self.ws
    }

    /// Returns a shared reference to the per-machine lock map.
    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for async contexts or spawning tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }

    /// Returns a cloned instance of the `WebSocketManager`.
    ///
    /// This allows handlers to broadcast without holding a reference.
    pub fn ws_clone(&self) -> WebSocketManager {
        self.ws.clone()
    }
}
