use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::{sync::mpsc, time};

use super::WebSocketManager;
use super::handler_trait::WsHandler;
use super::runtime::WsContext;

pub struct WsServerOptions {
    /// Interval for server-initiated WS-level pings.
    pub ws_ping_sec: u64,
    /// Budget for enqueueing one outbound frame; a slower observer is dropped.
    pub send_timeout_ms: u64,
    /// Reply to app-level `{"type":"ping"}` text frames with a pong frame.
    pub enable_app_ping: bool,
}

impl Default for WsServerOptions {
    fn default() -> Self {
        Self {
            ws_ping_sec: 30,
            send_timeout_ms: 1000,
            enable_app_ping: true,
        }
    }
}

/// Serves one observer connection subscribed to `topic`.
///
/// Broadcasts published on the topic are forwarded to the client through a
/// bounded outbound queue drained by a dedicated writer task. Failure anywhere
/// (socket error, enqueue timeout, lagged receiver) tears the connection down
/// and unsubscribes the observer; it never affects other observers or the
/// request that triggered the broadcast.
pub async fn serve_topic<H: WsHandler>(
    socket: WebSocket,
    manager: WebSocketManager,
    topic: String,
    handler: Arc<H>,
    opts: WsServerOptions,
) {
    let mut rx = manager.subscribe(&topic).await;
    let send_timeout = std::time::Duration::from_millis(opts.send_timeout_ms);

    let (mut sink, mut socket_rx) = socket.split();

    // Outbound queue and writer task
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(64);
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    let ctx = WsContext::new(topic.clone(), manager.clone(), out_tx.clone());

    // S→C: forward broadcasts on this topic
    let mut forward_task = {
        let out_tx = out_tx.clone();
        let topic = topic.clone();
        tokio::spawn(async move {
            while let Ok(msg) = rx.recv().await {
                match time::timeout(send_timeout, out_tx.send(Message::Text(msg.into()))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => {
                        tracing::info!("Client disconnected while sending to '{topic}'");
                        break;
                    }
                    Err(_) => {
                        tracing::warn!("Dropping slow observer on '{topic}' (send timeout)");
                        break;
                    }
                }
            }
        })
    };

    // WS-level periodic ping
    let ping_task = {
        let out_tx = out_tx.clone();
        tokio::spawn(async move {
            loop {
                time::sleep(std::time::Duration::from_secs(opts.ws_ping_sec)).await;
                if out_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        })
    };

    // Let feature handler know we're live
    handler.on_open(&ctx).await;

    // C→S: parse & dispatch
    let mut receive_task = {
        let handler = Arc::clone(&handler);
        let ctx = ctx;
        tokio::spawn(async move {
            while let Some(Ok(msg)) = socket_rx.next().await {
                match msg {
                    Message::Text(text) => {
                        let raw = text.as_str();
                        if opts.enable_app_ping && is_app_ping(raw) {
                            let _ = ctx
                                .reply_text(serde_json::json!({"type": "pong"}).to_string())
                                .await;
                            continue;
                        }
                        match serde_json::from_str::<H::In>(raw) {
                            Ok(parsed) => handler.on_message(&ctx, parsed).await,
                            Err(e) => tracing::warn!(
                                "WS invalid message on '{}': {e}; raw={raw}",
                                ctx.topic
                            ),
                        }
                    }
                    Message::Ping(payload) => {
                        let _ = ctx.reply_pong(payload).await;
                    }
                    Message::Pong(_) => {}
                    Message::Binary(_) => {
                        tracing::warn!("Ignoring binary on topic '{}'", ctx.topic);
                    }
                    Message::Close(_) => {
                        handler.on_close(&ctx).await;
                        break;
                    }
                }
            }
        })
    };

    // First task to finish ends the session; the rest are torn down so a dead
    // or slow observer releases its subscription promptly.
    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }
    ping_task.abort();
    drop(out_tx);
    writer_task.abort();
    tracing::info!("WS session ended for topic '{topic}'");
}

/// A bare `{"type":"ping"}` text frame is a liveness probe, not an app message.
fn is_app_ping(raw: &str) -> bool {
    if raw.trim() == "ping" {
        return true;
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        if let Some(Value::String(t)) = map.get("type") {
            return t == "ping";
        }
    }
    false
}
