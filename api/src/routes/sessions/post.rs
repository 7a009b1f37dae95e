use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use db::models::usage_session::{self, SessionError};
use util::state::AppState;

use crate::response::ApiResponse;
use crate::services::snapshot::SessionView;
use crate::ws::feed::publish_update;

/// POST /api/sessions/{session_id}/close
///
/// Explicit close at server time. Unlike the implicit close on `stop`, an
/// already-closed session here is a user-visible error.
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Option<SessionView>>>) {
    let session = match usage_session::Model::find_by_id(state.db(), session_id).await {
        Ok(Some(s)) => s,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Session not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Failed to load session: {e}"))),
            );
        }
    };

    // Serialize against event ingestion for the owning machine, then re-check
    // under the lock: a `stop` may have closed the session in the meantime.
    let _guard = state.locks().acquire(&session.machine_id).await;
    let session = match usage_session::Model::find_by_id(state.db(), session_id).await {
        Ok(Some(s)) => s,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Session not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Failed to load session: {e}"))),
            );
        }
    };

    match session.close(state.db(), Utc::now()).await {
        Ok(closed) => {
            publish_update(&state);
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    Some(SessionView::from(closed)),
                    "Session closed",
                )),
            )
        }
        Err(SessionError::AlreadyClosed) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::error("Session already closed")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to close session: {e}"))),
        ),
    }
}
