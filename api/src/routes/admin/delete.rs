use axum::{Json, extract::State, http::StatusCode};
use db::models::{machine, usage_session};
use sea_orm::{EntityTrait, TransactionTrait};
use serde_json::{Value, json};
use util::state::AppState;

use crate::response::ApiResponse;
use crate::ws::feed::publish_update;

/// DELETE /api/admin/reset
///
/// Wipes every session and machine. Irreversible; sessions go first because
/// of the foreign key.
pub async fn reset_database(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Value>>) {
    let result = async {
        let txn = state.db().begin().await?;
        let sessions = usage_session::Entity::delete_many().exec(&txn).await?;
        let machines = machine::Entity::delete_many().exec(&txn).await?;
        txn.commit().await?;
        Ok::<_, sea_orm::DbErr>((machines.rows_affected, sessions.rows_affected))
    }
    .await;

    match result {
        Ok((machines, sessions)) => {
            tracing::info!("Database reset: deleted {machines} machines and {sessions} sessions");
            publish_update(&state);
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    json!({ "deleted": { "machines": machines, "sessions": sessions } }),
                    "Database cleared",
                )),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to reset database: {e}"))),
        ),
    }
}
