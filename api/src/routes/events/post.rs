use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use util::state::AppState;

use crate::response::ApiResponse;
use crate::services::presence::{self, EventKind, NormalizedEvent};
use crate::ws::feed::publish_update;

/// Inbound event payload. An unrecognized `type` string is rejected at
/// deserialization, before any state mutation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCreateReq {
    pub machine_id: String,
    pub client_instance_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventAck {
    pub status: String,
    pub machine_id: String,
    pub event_type: String,
}

/// POST /api/events
pub async fn ingest_event(
    State(state): State<AppState>,
    Json(body): Json<EventCreateReq>,
) -> (StatusCode, Json<ApiResponse<EventAck>>) {
    if body.machine_id.trim().is_empty() || body.client_instance_id.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::error(
                "machineId and clientInstanceId must be non-empty",
            )),
        );
    }

    let event = NormalizedEvent {
        machine_id: body.machine_id.clone(),
        client_instance_id: body.client_instance_id.clone(),
        kind: body.kind,
        timestamp: presence::normalize_timestamp(body.timestamp),
    };

    match presence::apply_event(&state, &event).await {
        Ok(()) => {
            // The mutation is committed; fan-out is best-effort from here.
            publish_update(&state);
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    EventAck {
                        status: "ok".into(),
                        machine_id: body.machine_id,
                        event_type: body.kind.as_str().into(),
                    },
                    "Event accepted",
                )),
            )
        }
        Err(e) => (e.status(), Json(ApiResponse::error(e.to_string()))),
    }
}
