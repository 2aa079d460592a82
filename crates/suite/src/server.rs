//! The Suite's WebSocket server.
//!
//! - `GET /`: WebSocket upgrade for agents and clients
//! - `GET /health`: liveness check

use crate::heartbeat::run_heartbeat;
use crate::hub::{ConnectionId, HubSettings, Outbound, SuiteHub};
use crate::protocol::SuiteMessage;
use agentsuite_config::SuiteConfig;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::response::{IntoResponse, Json};
use axum::Router;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const CLOSE_GRACE: Duration = Duration::from_secs(5);

pub fn router(hub: Arc<SuiteHub>) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(hub)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &SuiteConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    let hub = Arc::new(SuiteHub::new(HubSettings::from_config(config)));
    serve_until(listener, hub, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Serve forever on an already-bound listener.
pub async fn serve_listener(listener: TcpListener, hub: Arc<SuiteHub>) -> std::io::Result<()> {
    serve_until(listener, hub, std::future::pending()).await
}

/// Serve until `shutdown` completes, then close every connection and stop.
pub async fn serve_until<F>(listener: TcpListener, hub: Arc<SuiteHub>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Suite listening on ws://{addr}");
    }
    let closing = hub.clone();
    axum::serve(listener, router(hub))
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Suite shutting down");
            closing.close_all().await;
        })
        .await
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<SuiteHub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, hub))
}

async fn handle_connection(socket: WebSocket, hub: Arc<SuiteHub>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let id = hub.register(tx).await;
    info!(connection = id, "WebSocket connection established");

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let frame = match frame {
                Outbound::Message(msg) => WsMessage::Text(msg.to_json().into()),
                Outbound::Ping => WsMessage::Ping(Bytes::new()),
                Outbound::Close => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }
            };
            if sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    let heartbeat = tokio::spawn(run_heartbeat(hub.clone(), id));

    let reader_hub = hub.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => dispatch(&reader_hub, id, text.as_str()).await,
                Ok(WsMessage::Pong(_)) => reader_hub.record_pong(id).await,
                Ok(WsMessage::Close(_)) => {
                    debug!(connection = id, "Peer closed the connection");
                    break;
                }
                // axum answers pings on its own
                Ok(_) => {}
                Err(e) => {
                    warn!(connection = id, error = %e, "WebSocket receive failed");
                    break;
                }
            }
        }
    });

    let writer_done = tokio::select! {
        result = &mut writer => {
            if let Err(e) = result {
                error!(connection = id, error = ?e, "Writer task panicked");
            }
            true
        }
        result = &mut reader => {
            if let Err(e) = result {
                error!(connection = id, error = ?e, "Reader task panicked");
            }
            false
        }
    };

    heartbeat.abort();
    reader.abort();
    hub.disconnect(id).await;
    if !writer_done {
        // Give the writer a moment to flush the close frame queued by disconnect.
        if tokio::time::timeout(CLOSE_GRACE, &mut writer).await.is_err() {
            writer.abort();
        }
    }
    info!(connection = id, "WebSocket connection closed");
}

async fn dispatch(hub: &SuiteHub, id: ConnectionId, text: &str) {
    match SuiteMessage::parse(text) {
        Ok(message) => {
            debug!(connection = id, kind = message.kind(), "Message received");
            hub.handle(id, message).await;
        }
        Err(e) => {
            warn!(connection = id, error = %e, "Rejected malformed message");
            hub.send(id, SuiteMessage::error(e.to_string(), None)).await;
        }
    }
}
