//! Tandem WebSocket Relay Server
//!
//! A stateless relay: every well-formed JSON text frame a client sends is
//! forwarded unchanged to every connected client, the sender included, in
//! one global order. The relay never inspects message types, keeps no board
//! state and does not announce joins or departures. A connection that falls
//! more than the channel capacity behind is closed.

pub mod config;
pub mod hub;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        ConnectInfo, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

pub use config::{ConfigError, ServerConfig};
pub use hub::{ConnectionId, RelayHub};

/// Build the HTTP router: `/ws` upgrades, `/health` and `/` answer plain text.
pub fn router(hub: Arc<RelayHub>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

/// Serve the relay on `listener` until the process exits.
pub async fn serve(listener: TcpListener, hub: Arc<RelayHub>) -> std::io::Result<()> {
    axum::serve(
        listener,
        router(hub).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

/// Index page
async fn index() -> &'static str {
    "Tandem Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(hub): State<Arc<RelayHub>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, hub))
}

/// Pump one connection until either side goes away.
async fn handle_socket(socket: WebSocket, addr: SocketAddr, hub: Arc<RelayHub>) {
    let (id, mut relayed) = hub.subscribe(addr);
    info!("New connection {} from {}", id, addr);

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        hub.relay(id, text);
                    }
                    Some(Ok(Message::Binary(data))) => match hub::binary_to_text(data) {
                        Some(text) => {
                            hub.relay(id, text);
                        }
                        None => debug!("Dropping non-UTF-8 binary frame from {}", id),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Ping/pong are answered by axum
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", id, e);
                        break;
                    }
                }
            }

            frame = relayed.recv() => {
                match frame {
                    Ok(text) => {
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Missed frames cannot be replayed.
                        warn!("Connection {} fell {} frames behind, closing", id, skipped);
                        let close = CloseFrame {
                            code: close_code::AGAIN,
                            reason: Utf8Bytes::from_static("relay lagged"),
                        };
                        let _ = sender.send(Message::Close(Some(close))).await;
                        break;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    if let Some(conn) = hub.disconnect(id) {
        info!("Connection {} from {} closed", id, conn.addr);
    }
}
