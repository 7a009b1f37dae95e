//! Read-side assembly of the consolidated fleet view.
//!
//! Joins each machine with its currently open session into the wire shape
//! shared by the poll endpoint and the WebSocket feed. Pure read; always run
//! right after a reconciler pass so the view is self-consistent at the moment
//! of assembly.

use chrono::{DateTime, Utc};
use db::models::machine;
use db::models::usage_session::{self, PaidStatus};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use util::state::AppState;

use super::error::ServiceError;
use super::reconciler;

/// Wire shape of one session. Timestamps carry an explicit UTC offset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: i64,
    pub machine_id: String,
    pub user_name: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub paid_status: PaidStatus,
    pub amount_due: Option<f64>,
    pub amount_paid: Option<f64>,
    pub notes: Option<String>,
}

impl From<usage_session::Model> for SessionView {
    fn from(s: usage_session::Model) -> Self {
        Self {
            id: s.id,
            machine_id: s.machine_id,
            user_name: s.user_name,
            start_at: s.start_at,
            end_at: s.end_at,
            duration_seconds: s.duration_seconds,
            paid_status: s.paid_status,
            amount_due: s.amount_due,
            amount_paid: s.amount_paid,
            notes: s.notes,
        }
    }
}

/// One machine joined with its open session, status as its wire string.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSnapshot {
    pub id: i64,
    pub machine_id: String,
    pub client_instance_id: String,
    pub last_seen_at: DateTime<Utc>,
    pub status: &'static str,
    pub active_session: Option<SessionView>,
}

/// Joins every machine with its open session, ordered by `machine_id`.
pub async fn assemble<C: ConnectionTrait>(db: &C) -> Result<Vec<MachineSnapshot>, ServiceError> {
    let machines = machine::Model::all_ordered(db).await?;
    let mut out = Vec::with_capacity(machines.len());
    for m in machines {
        let active = usage_session::Model::find_open_for(db, &m.machine_id)
            .await?
            .map(SessionView::from);
        out.push(MachineSnapshot {
            id: m.id,
            machine_id: m.machine_id,
            client_instance_id: m.client_instance_id,
            last_seen_at: m.last_seen_at,
            status: m.status.as_str(),
            active_session: active,
        });
    }
    Ok(out)
}

/// The consolidated view: reconcile staleness, then assemble.
pub async fn consolidated(state: &AppState) -> Result<Vec<MachineSnapshot>, ServiceError> {
    reconciler::reconcile(state).await?;
    assemble(state.db()).await
}
