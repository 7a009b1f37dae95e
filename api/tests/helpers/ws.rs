use axum::Router;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::client::IntoClientRequest,
};

/// Spawns the Axum app on a random local port.
pub async fn spawn_server(app: Router) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// Connects one observer to the fleet feed.
pub async fn connect_fleet(
    addr: &std::net::SocketAddr,
) -> WebSocketStream<MaybeTlsStream<TcpStream>> {
    let req = format!("ws://{addr}/ws/fleet").into_client_request().unwrap();
    let (ws, _) = connect_async(req).await.unwrap();
    ws
}
