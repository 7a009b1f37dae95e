// util/ws/axum_adapter.rs
use super::handler_trait::WsHandler;
use super::serve::{WsServerOptions, serve_topic};
use crate::state::AppState;
use axum::{
    extract::{State, WebSocketUpgrade, ws::WebSocket},
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn ws_route<H, FTopic>(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    topic_fn: FTopic,
    handler: Arc<H>,
    opts: WsServerOptions,
) -> impl IntoResponse
where
    H: WsHandler,
    FTopic: Fn() -> String + Send + 'static,
{
    let ws_manager = state.ws_clone();

    ws.on_upgrade(move |socket: WebSocket| {
        let topic = topic_fn();
        let handler = Arc::clone(&handler);
        let manager = ws_manager.clone();
        async move {
            serve_topic(socket, manager, topic, handler, opts).await;
        }
    })
}
