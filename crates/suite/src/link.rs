//! Reconnecting WebSocket link used by both the client and the agent
//! connector.
//!
//! The link owns one socket at a time. When it drops, the link waits the
//! configured delay and dials again, forever, until shut down. Outgoing
//! messages queue on an unbounded channel that outlives individual sockets.

use crate::error::SuiteError;
use crate::protocol::SuiteMessage;
use agentsuite_config::ClientConfig;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub url: String,
    pub reconnect_delay: Duration,
}

impl LinkSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: Duration::from_secs(5),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            url: config.suite_url.clone(),
            reconnect_delay: config.reconnect_delay(),
        }
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// What a link does with the traffic it carries.
#[async_trait]
pub(crate) trait LinkHandler: Send + Sync + 'static {
    /// Sent first on every fresh socket.
    fn greeting(&self) -> SuiteMessage;

    async fn on_message(&self, message: SuiteMessage);
}

/// Handle to a running link task.
pub(crate) struct Link {
    outbox: mpsc::UnboundedSender<SuiteMessage>,
    shutdown: watch::Sender<bool>,
    connected: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl Link {
    /// Dial once, failing fast if the Suite is unreachable, then keep the
    /// link up in the background.
    pub(crate) async fn open<H: LinkHandler>(
        settings: LinkSettings,
        handler: Arc<H>,
        outbox: mpsc::UnboundedSender<SuiteMessage>,
        queued: mpsc::UnboundedReceiver<SuiteMessage>,
    ) -> Result<Self, SuiteError> {
        let socket = dial(&settings.url).await?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (connected_tx, connected) = watch::channel(true);
        let task = tokio::spawn(run(settings, handler, socket, queued, shutdown_rx, connected_tx));
        Ok(Self {
            outbox,
            shutdown,
            connected,
            task,
        })
    }

    pub(crate) fn send(&self, message: SuiteMessage) -> Result<(), SuiteError> {
        self.outbox.send(message).map_err(|_| SuiteError::Closed)
    }

    pub(crate) fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub(crate) async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = ?e, "Link task ended abnormally");
        }
    }

    /// Wait for the link task to end on its own.
    pub(crate) async fn join(self) {
        let _ = self.task.await;
    }
}

async fn dial(url: &str) -> Result<Socket, SuiteError> {
    let (socket, _response) = connect_async(url)
        .await
        .map_err(|e| SuiteError::Transport(format!("{url}: {e}")))?;
    Ok(socket)
}

async fn run<H: LinkHandler>(
    settings: LinkSettings,
    handler: Arc<H>,
    first: Socket,
    mut queued: mpsc::UnboundedReceiver<SuiteMessage>,
    mut shutdown: watch::Receiver<bool>,
    connected: watch::Sender<bool>,
) {
    let mut socket = Some(first);
    loop {
        if let Some(ws) = socket.take() {
            let _ = connected.send(true);
            info!(url = %settings.url, "Connected to suite");
            let ended = session(ws, handler.as_ref(), &mut queued, &mut shutdown).await;
            let _ = connected.send(false);
            match ended {
                Ok(()) => {
                    info!(url = %settings.url, "Link shut down");
                    return;
                }
                Err(e) => warn!(url = %settings.url, error = %e, "Suite connection dropped"),
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(settings.reconnect_delay) => {}
            _ = shutdown.changed() => return,
        }
        if *shutdown.borrow() {
            return;
        }

        match dial(&settings.url).await {
            Ok(ws) => socket = Some(ws),
            Err(e) => debug!(error = %e, delay_ms = settings.reconnect_delay.as_millis() as u64, "Reconnect failed"),
        }
    }
}

/// Pump one socket until it drops (`Err`) or the link is shut down (`Ok`).
async fn session<H: LinkHandler>(
    ws: Socket,
    handler: &H,
    queued: &mut mpsc::UnboundedReceiver<SuiteMessage>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), SuiteError> {
    let (mut sink, mut stream) = ws.split();
    let lost = |e: tokio_tungstenite::tungstenite::Error| SuiteError::ConnectionLost(e.to_string());

    sink.send(WsMessage::Text(handler.greeting().to_json().into()))
        .await
        .map_err(lost)?;

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = sink.send(WsMessage::Close(None)).await;
                return Ok(());
            }
            outgoing = queued.recv() => match outgoing {
                Some(message) => {
                    sink.send(WsMessage::Text(message.to_json().into())).await.map_err(lost)?;
                }
                None => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    return Ok(());
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => match SuiteMessage::parse(text.as_str()) {
                    Ok(message) => handler.on_message(message).await,
                    Err(e) => warn!(error = %e, "Ignoring malformed message from suite"),
                },
                Some(Ok(WsMessage::Ping(data))) => {
                    sink.send(WsMessage::Pong(data)).await.map_err(lost)?;
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    let reason = frame.map(|f| f.reason.as_str().to_owned()).unwrap_or_default();
                    return Err(SuiteError::ConnectionLost(format!("closed by suite: {reason}")));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(lost(e)),
                None => return Err(SuiteError::ConnectionLost("stream ended".into())),
            },
        }
    }
}
