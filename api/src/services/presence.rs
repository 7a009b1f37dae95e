//! The presence state machine.
//!
//! Consumes one normalized event at a time for one machine key and deduces the
//! machine's ONLINE/OFFLINE status plus the required session transitions. The
//! whole read-modify-write runs inside a transaction under the machine's keyed
//! lock, so concurrent events for the same machine serialize and the
//! at-most-one-open-session invariant holds.

use chrono::{DateTime, FixedOffset, Utc};
use db::models::machine::{self, Status};
use db::models::usage_session;
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use util::state::AppState;

use super::error::ServiceError;

/// The input alphabet of the state machine, with its wire spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Heartbeat,
    Stop,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Heartbeat => "heartbeat",
            EventKind::Stop => "stop",
        }
    }
}

/// An ingestion event after boundary validation and timestamp normalization.
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    pub machine_id: String,
    pub client_instance_id: String,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

/// Converts a caller-supplied timestamp (any offset) to UTC.
///
/// Comparisons across machines and against the staleness threshold must be
/// timezone-consistent, so this happens once at the boundary; every outbound
/// timestamp is re-serialized with an explicit UTC offset.
pub fn normalize_timestamp(ts: DateTime<FixedOffset>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

/// Applies one event to the machine it names.
///
/// - `start`: machine ONLINE; a stranded open session (missed `stop`, e.g.
///   crash-then-restart) is closed at the event timestamp; a new session
///   always opens at the event timestamp.
/// - `heartbeat`: machine ONLINE; a missing session (missed `start`, e.g.
///   server restart mid-session) is self-healed by opening one at the event
///   timestamp; an existing open session is left untouched.
/// - `stop`: machine OFFLINE; the open session, if any, closes at the event
///   timestamp; no-op on the session dimension otherwise.
///
/// The first event of any kind materializes the machine record.
pub async fn apply_event(state: &AppState, event: &NormalizedEvent) -> Result<(), ServiceError> {
    let _guard = state.locks().acquire(&event.machine_id).await;

    let txn = state.db().begin().await?;
    let machine = match machine::Model::find_by_machine_id(&txn, &event.machine_id).await? {
        Some(m) => m,
        None => {
            tracing::info!("Materializing machine '{}' on first event", event.machine_id);
            machine::Model::create(
                &txn,
                &event.machine_id,
                &event.client_instance_id,
                event.timestamp,
            )
            .await?
        }
    };

    match event.kind {
        EventKind::Start => {
            machine
                .set_presence(&txn, Status::Online, event.timestamp)
                .await?;
            close_if_open(&txn, &event.machine_id, event.timestamp).await?;
            usage_session::Model::open(&txn, &event.machine_id, event.timestamp).await?;
        }
        EventKind::Heartbeat => {
            machine
                .set_presence(&txn, Status::Online, event.timestamp)
                .await?;
            if usage_session::Model::find_open_for(&txn, &event.machine_id)
                .await?
                .is_none()
            {
                tracing::info!(
                    "Self-healing session for '{}' (heartbeat received without open session)",
                    event.machine_id
                );
                usage_session::Model::open(&txn, &event.machine_id, event.timestamp).await?;
            }
        }
        EventKind::Stop => {
            machine
                .set_presence(&txn, Status::Offline, event.timestamp)
                .await?;
            close_if_open(&txn, &event.machine_id, event.timestamp).await?;
        }
    }

    txn.commit().await?;
    Ok(())
}

/// Closes the machine's open session at `end_at`, silently accepting the case
/// where none is open (implicit close is idempotent; only the explicit
/// close-by-id endpoint surfaces `AlreadyClosed`).
async fn close_if_open<C: ConnectionTrait>(
    db: &C,
    machine_id: &str,
    end_at: DateTime<Utc>,
) -> Result<(), ServiceError> {
    if let Some(open) = usage_session::Model::find_open_for(db, machine_id).await? {
        match open.close(db, end_at).await {
            Ok(_) | Err(db::models::usage_session::SessionError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use db::test_utils::setup_test_db;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap()
    }

    fn event(kind: EventKind, at: DateTime<Utc>) -> NormalizedEvent {
        NormalizedEvent {
            machine_id: "pc-01".into(),
            client_instance_id: "uuid-1".into(),
            kind,
            timestamp: at,
        }
    }

    async fn test_state() -> AppState {
        AppState::new(setup_test_db().await)
    }

    async fn open_session_count(state: &AppState) -> usize {
        usage_session::Model::list(state.db(), &Default::default())
            .await
            .unwrap()
            .iter()
            .filter(|s| s.end_at.is_none())
            .count()
    }

    #[tokio::test]
    async fn first_event_materializes_machine() {
        let state = test_state().await;
        apply_event(&state, &event(EventKind::Heartbeat, t0()))
            .await
            .unwrap();
        let m = machine::Model::find_by_machine_id(state.db(), "pc-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.status, Status::Online);
        assert_eq!(m.last_seen_at, t0());
    }

    #[tokio::test]
    async fn start_opens_exactly_one_session() {
        let state = test_state().await;
        apply_event(&state, &event(EventKind::Start, t0())).await.unwrap();
        assert_eq!(open_session_count(&state).await, 1);
        let s = usage_session::Model::find_open_for(state.db(), "pc-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(s.start_at, t0());
    }

    #[tokio::test]
    async fn start_supersedes_stranded_open_session() {
        let state = test_state().await;
        apply_event(&state, &event(EventKind::Start, t0())).await.unwrap();
        let restart = t0() + chrono::Duration::seconds(90);
        apply_event(&state, &event(EventKind::Start, restart)).await.unwrap();

        let all = usage_session::Model::list(state.db(), &Default::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        let open = usage_session::Model::find_open_for(state.db(), "pc-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(open.start_at, restart);
        let closed = all.iter().find(|s| s.end_at.is_some()).unwrap();
        assert_eq!(closed.end_at, Some(restart));
        assert_eq!(closed.duration_seconds, Some(90));
    }

    #[tokio::test]
    async fn heartbeat_self_heals_missing_session() {
        let state = test_state().await;
        apply_event(&state, &event(EventKind::Heartbeat, t0()))
            .await
            .unwrap();
        let open = usage_session::Model::find_open_for(state.db(), "pc-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(open.start_at, t0());
    }

    #[tokio::test]
    async fn heartbeat_leaves_existing_session_untouched() {
        let state = test_state().await;
        apply_event(&state, &event(EventKind::Start, t0())).await.unwrap();
        let beat = t0() + chrono::Duration::seconds(30);
        apply_event(&state, &event(EventKind::Heartbeat, beat)).await.unwrap();

        let open = usage_session::Model::find_open_for(state.db(), "pc-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(open.start_at, t0());
        let m = machine::Model::find_by_machine_id(state.db(), "pc-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.last_seen_at, beat);
    }

    #[tokio::test]
    async fn stop_closes_session_and_goes_offline() {
        let state = test_state().await;
        apply_event(&state, &event(EventKind::Start, t0())).await.unwrap();
        let stop = t0() + chrono::Duration::seconds(40);
        apply_event(&state, &event(EventKind::Stop, stop)).await.unwrap();

        assert_eq!(open_session_count(&state).await, 0);
        let all = usage_session::Model::list(state.db(), &Default::default())
            .await
            .unwrap();
        assert_eq!(all[0].duration_seconds, Some(40));
        let m = machine::Model::find_by_machine_id(state.db(), "pc-01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(m.status, Status::Offline);
    }

    #[tokio::test]
    async fn double_stop_is_idempotent() {
        let state = test_state().await;
        apply_event(&state, &event(EventKind::Start, t0())).await.unwrap();
        apply_event(&state, &event(EventKind::Stop, t0() + chrono::Duration::seconds(10)))
            .await
            .unwrap();
        apply_event(&state, &event(EventKind::Stop, t0() + chrono::Duration::seconds(20)))
            .await
            .unwrap();

        assert_eq!(open_session_count(&state).await, 0);
        let all = usage_session::Model::list(state.db(), &Default::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].duration_seconds, Some(10));
    }

    #[tokio::test]
    async fn concurrent_events_never_open_two_sessions() {
        let state = test_state().await;
        let mut handles = Vec::new();
        for i in 0..6 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                let kind = if i % 2 == 0 {
                    EventKind::Start
                } else {
                    EventKind::Heartbeat
                };
                let at = t0() + chrono::Duration::seconds(i);
                apply_event(&state, &event(kind, at)).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert!(open_session_count(&state).await <= 1);
    }

    #[test]
    fn normalize_converts_offset_to_utc() {
        let ts = DateTime::parse_from_rfc3339("2026-02-10T14:00:00+02:00").unwrap();
        assert_eq!(normalize_timestamp(ts), t0());
    }
}
