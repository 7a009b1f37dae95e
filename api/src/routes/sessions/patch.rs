use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::usage_session::{self, PaidStatus, SessionUpdate};
use serde::Deserialize;
use util::state::AppState;

use crate::response::ApiResponse;
use crate::services::snapshot::SessionView;
use crate::ws::feed::publish_update;

/// Field-level billing/user update. Absent fields are left untouched; an
/// unrecognized `paidStatus` string is rejected at deserialization.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionReq {
    pub user_name: Option<String>,
    pub paid_status: Option<PaidStatus>,
    pub amount_due: Option<f64>,
    pub amount_paid: Option<f64>,
    pub notes: Option<String>,
}

/// PATCH /api/sessions/{session_id}
pub async fn update_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Json(body): Json<UpdateSessionReq>,
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

    let update = SessionUpdate {
        user_name: body.user_name,
        paid_status: body.paid_status,
        amount_due: body.amount_due,
        amount_paid: body.amount_paid,
        notes: body.notes,
    };

    match session.merge_update(state.db(), update).await {
        Ok(updated) => {
            publish_update(&state);
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    Some(SessionView::from(updated)),
                    "Session updated",
                )),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to update session: {e}"))),
        ),
    }
}
