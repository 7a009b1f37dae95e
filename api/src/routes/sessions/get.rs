use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use db::models::usage_session::{self, PaidStatus, SessionFilter};
use serde::Deserialize;
use util::state::AppState;

use crate::response::ApiResponse;
use crate::services::snapshot::SessionView;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListQuery {
    /// Filter by paid status (PAID/UNPAID).
    pub status: Option<String>,
    /// Filter by machine id.
    pub machine_id: Option<String>,
    /// Filter by user name substring.
    pub user: Option<String>,
    /// Filter by start date range (inclusive).
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// GET /api/sessions
///
/// Session history, newest first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> (StatusCode, Json<ApiResponse<Vec<SessionView>>>) {
    let paid_status = match query.status.as_deref() {
        None => None,
        Some("PAID") => Some(PaidStatus::Paid),
        Some("UNPAID") => Some(PaidStatus::Unpaid),
        Some(other) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::error(format!(
                    "Unknown paid status '{other}' (expected PAID or UNPAID)"
                ))),
            );
        }
    };

    let filter = SessionFilter {
        paid_status,
        machine_id: query.machine_id,
        user: query.user,
        start_from: query
            .date_from
            .map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc()),
        start_to: query
            .date_to
            .map(|d| d.and_hms_opt(23, 59, 59).unwrap().and_utc()),
    };

    match usage_session::Model::list(state.db(), &filter).await {
        Ok(sessions) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                sessions.into_iter().map(SessionView::from).collect(),
                "Sessions retrieved",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to list sessions: {e}"))),
        ),
    }
}
