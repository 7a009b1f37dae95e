//! The real-time fleet feed.
//!
//! Every observer subscribes to the single fleet topic. On connect it receives
//! one `initial_state` frame (the reconciled consolidated view); after every
//! accepted mutation all observers receive an `update` frame with the same
//! list shape. Liveness probes (`{"type":"ping"}`) are answered with pong
//! frames by the socket runtime and never touch snapshot delivery.

use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
};
use serde_json::json;
use std::sync::Arc;
use util::config;
use util::state::AppState;
use util::ws::axum_adapter::ws_route;
use util::ws::handler_trait::WsHandler;
use util::ws::runtime::WsContext;
use util::ws::serve::WsServerOptions;

use super::topics::fleet_topic;
use crate::services::snapshot;

pub struct FleetFeedHandler {
    state: AppState,
}

impl WsHandler for FleetFeedHandler {
    // Anything that isn't a liveness probe is ignored; the feed is one-way.
    type In = serde_json::Value;

    async fn on_open(&self, ctx: &WsContext) {
        match snapshot::consolidated(&self.state).await {
            Ok(data) => {
                let frame = json!({ "type": "initial_state", "data": data });
                if ctx.reply_text(frame.to_string()).await.is_err() {
                    tracing::warn!("Observer dropped before initial snapshot was sent");
                }
            }
            Err(e) => {
                tracing::error!("Failed to assemble initial snapshot: {e}");
            }
        }
    }

    async fn on_message(&self, ctx: &WsContext, _msg: Self::In) {
        tracing::debug!("Ignoring client message on '{}'", ctx.topic);
    }
}

pub async fn fleet_feed_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    let handler = Arc::new(FleetFeedHandler {
        state: app_state.clone(),
    });

    let opts = WsServerOptions {
        ws_ping_sec: config::ws_ping_seconds(),
        send_timeout_ms: config::ws_send_timeout_ms(),
        ..Default::default()
    };

    ws_route(ws, State(app_state), fleet_topic, handler, opts).await
}

/// Publishes a fresh snapshot to every observer after a committed mutation.
///
/// Fire-and-forget relative to the request that triggered it: the fan-out
/// runs in its own task and its failures are logged, never surfaced to the
/// caller.
pub fn publish_update(state: &AppState) {
    let state = state.clone();
    tokio::spawn(async move {
        match snapshot::consolidated(&state).await {
            Ok(data) => {
                let frame = json!({ "type": "update", "data": data });
                state.ws().broadcast(&fleet_topic(), frame.to_string()).await;
            }
            Err(e) => {
                tracing::error!("Failed to broadcast fleet update: {e}");
            }
        }
    });
}
