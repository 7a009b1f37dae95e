//! Staleness reconciliation.
//!
//! A machine that silently disappears (power cut, network drop) never sends a
//! `stop`, so its row stays ONLINE forever. This sweep runs synchronously at
//! the start of every consolidated read and before every broadcast snapshot:
//! no background timer, just catch-up on observation. One configurable
//! threshold is used everywhere so every read path agrees on who is online.

use chrono::{Duration, Utc};
use db::models::machine::{self, Status};
use db::models::usage_session;
use sea_orm::TransactionTrait;
use util::{config, state::AppState};

use super::error::ServiceError;

/// Forces every silent ONLINE machine OFFLINE and closes its open session.
///
/// The session closes at the machine's `last_seen_at`, not at detection time:
/// the last confirmed heartbeat is the end of billable use. Each stale machine
/// is re-checked under its keyed lock since it may have reported again between
/// the scan and the sweep.
pub async fn reconcile(state: &AppState) -> Result<(), ServiceError> {
    let threshold = Utc::now() - Duration::seconds(config::offline_threshold_seconds());

    let candidates = machine::Model::find_stale(state.db(), threshold).await?;
    for candidate in candidates {
        let _guard = state.locks().acquire(&candidate.machine_id).await;

        let txn = state.db().begin().await?;
        let Some(current) =
            machine::Model::find_by_machine_id(&txn, &candidate.machine_id).await?
        else {
            continue;
        };
        if current.status != Status::Online || current.last_seen_at >= threshold {
            continue;
        }

        let last_seen = current.last_seen_at;
        tracing::info!(
            "Reconciler: '{}' silent since {last_seen}, forcing OFFLINE",
            current.machine_id
        );
        let machine_id = current.machine_id.clone();
        current.set_presence(&txn, Status::Offline, last_seen).await?;

        if let Some(open) = usage_session::Model::find_open_for(&txn, &machine_id).await? {
            match open.close(&txn, last_seen).await {
                Ok(_) | Err(db::models::usage_session::SessionError::AlreadyClosed) => {}
                Err(e) => return Err(e.into()),
            }
        }
        txn.commit().await?;
    }

    Ok(())
}
