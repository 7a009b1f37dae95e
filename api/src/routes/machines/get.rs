use axum::{Json, extract::State, http::StatusCode};
use util::state::AppState;

use crate::response::ApiResponse;
use crate::services::snapshot::{self, MachineSnapshot};

/// GET /api/machines
///
/// Reconciles staleness, then returns every machine joined with its open
/// session, ordered by `machineId`.
pub async fn get_machines(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<MachineSnapshot>>>) {
    match snapshot::consolidated(&state).await {
        Ok(machines) => (
            StatusCode::OK,
            Json(ApiResponse::success(machines, "Machines retrieved")),
        ),
        Err(e) => (e.status(), Json(ApiResponse::error(e.to_string()))),
    }
}
