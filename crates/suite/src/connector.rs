//! Agent side of the Suite: join under the agent's name and answer routed
//! queries.

use crate::error::SuiteError;
use crate::link::{Link, LinkHandler, LinkSettings};
use crate::protocol::SuiteMessage;
use agentsuite_agent::Agent;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Anything that can answer a query under a fixed name.
#[async_trait]
pub trait Responder: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn respond(&self, query: &str) -> Result<String, agentsuite_core::Error>;
}

#[async_trait]
impl Responder for Agent {
    fn name(&self) -> &str {
        Agent::name(self)
    }

    async fn respond(&self, query: &str) -> Result<String, agentsuite_core::Error> {
        self.run(query).await
    }
}

struct ConnectorHandler {
    responder: Arc<dyn Responder>,
    outbox: mpsc::UnboundedSender<SuiteMessage>,
    rejoin_delay: Duration,
    rejoin_scheduled: Arc<AtomicBool>,
}

impl ConnectorHandler {
    /// Send the join again after the reconnect delay. At most one retry is
    /// outstanding at a time.
    fn schedule_rejoin(&self) {
        if self.rejoin_scheduled.swap(true, Ordering::AcqRel) {
            return;
        }
        let scheduled = self.rejoin_scheduled.clone();
        let outbox = self.outbox.clone();
        let join = self.greeting();
        let delay = self.rejoin_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            scheduled.store(false, Ordering::Release);
            let _ = outbox.send(join);
        });
    }
}

#[async_trait]
impl LinkHandler for ConnectorHandler {
    fn greeting(&self) -> SuiteMessage {
        SuiteMessage::Join {
            name: self.responder.name().to_string(),
        }
    }

    async fn on_message(&self, message: SuiteMessage) {
        match message {
            SuiteMessage::AgentQuery { query, request_id } => {
                // The agent serializes its own runs, so concurrent queries queue there.
                let responder = self.responder.clone();
                let outbox = self.outbox.clone();
                tokio::spawn(async move {
                    info!(agent = %responder.name(), request_id = %request_id, "Answering query");
                    let reply = match responder.respond(&query).await {
                        Ok(result) => SuiteMessage::AgentQueryResponse { request_id, result },
                        Err(e) => {
                            error!(agent = %responder.name(), request_id = %request_id, error = %e, "Query failed");
                            SuiteMessage::error(e.to_string(), Some(request_id))
                        }
                    };
                    if outbox.send(reply).is_err() {
                        warn!(agent = %responder.name(), "Link closed before the answer could be sent");
                    }
                });
            }
            // The only request-less error a Suite sends an agent is a refused
            // join, typically while a dead socket of ours still holds the name.
            SuiteMessage::Error {
                message,
                request_id: None,
            } => {
                warn!(
                    agent = %self.responder.name(),
                    error = %message,
                    retry_ms = self.rejoin_delay.as_millis() as u64,
                    "Join refused, retrying"
                );
                self.schedule_rejoin();
            }
            SuiteMessage::Error { message, .. } => {
                error!(agent = %self.responder.name(), error = %message, "Suite reported an error");
            }
            SuiteMessage::System { message, .. } => info!(agent = %self.responder.name(), "{message}"),
            other => warn!(agent = %self.responder.name(), kind = other.kind(), "Ignoring message"),
        }
    }
}

/// A live connection between one agent and a Suite.
pub struct AgentConnector {
    name: String,
    link: Link,
}

impl AgentConnector {
    pub async fn connect(responder: Arc<dyn Responder>, settings: LinkSettings) -> Result<Self, SuiteError> {
        let name = responder.name().to_string();
        let (outbox, queued) = mpsc::unbounded_channel();
        let handler = Arc::new(ConnectorHandler {
            responder,
            outbox: outbox.clone(),
            rejoin_delay: settings.reconnect_delay,
            rejoin_scheduled: Arc::new(AtomicBool::new(false)),
        });
        let link = Link::open(settings, handler, outbox, queued).await?;
        info!(agent = %name, "Agent connector started");
        Ok(Self { name, link })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Serve until the link stops.
    pub async fn run(self) {
        self.link.join().await;
    }

    pub async fn shutdown(self) {
        self.link.shutdown().await;
    }
}
