//! Client side of the Suite: send queries to named agents and await the
//! correlated responses.

use crate::correlation::PendingRequests;
use crate::error::SuiteError;
use crate::link::{Link, LinkHandler, LinkSettings};
use crate::protocol::SuiteMessage;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Snapshot returned by the Suite's `status` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteStatus {
    pub clients: usize,
    pub agents: Vec<String>,
    pub uptime_secs: u64,
}

type StatusWaiters = Arc<Mutex<VecDeque<oneshot::Sender<SuiteStatus>>>>;

struct ClientHandler {
    name: String,
    pending: PendingRequests,
    status_waiters: StatusWaiters,
}

#[async_trait]
impl LinkHandler for ClientHandler {
    fn greeting(&self) -> SuiteMessage {
        SuiteMessage::ClientJoin {
            client_name: self.name.clone(),
        }
    }

    async fn on_message(&self, message: SuiteMessage) {
        match message {
            SuiteMessage::ClientQueryResponse { request_id, result } => {
                if !self.pending.resolve(&request_id, Ok(result)).await {
                    debug!(request_id = %request_id, "Discarded late response");
                }
            }
            SuiteMessage::Error {
                message,
                request_id: Some(request_id),
            } => {
                if !self.pending.resolve(&request_id, Err(SuiteError::Routing(message))).await {
                    debug!(request_id = %request_id, "Discarded late error");
                }
            }
            SuiteMessage::Error { message, request_id: None } => {
                warn!(client = %self.name, error = %message, "Suite reported an error");
            }
            SuiteMessage::System { message, .. } => info!(client = %self.name, "{message}"),
            SuiteMessage::Status {
                clients,
                agents,
                uptime_secs,
            } => {
                let waiter = self
                    .status_waiters
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .pop_front();
                if let Some(waiter) = waiter {
                    let _ = waiter.send(SuiteStatus {
                        clients: clients.unwrap_or_default(),
                        agents: agents.unwrap_or_default(),
                        uptime_secs: uptime_secs.unwrap_or_default(),
                    });
                }
            }
            other => debug!(client = %self.name, kind = other.kind(), "Ignoring message"),
        }
    }
}

pub struct SuiteClient {
    name: String,
    link: Link,
    pending: PendingRequests,
    status_waiters: StatusWaiters,
}

impl SuiteClient {
    /// Connect and identify as `name`. Fails if the first dial fails;
    /// later drops are redialled in the background.
    pub async fn connect(name: impl Into<String>, settings: LinkSettings) -> Result<Self, SuiteError> {
        let name = name.into();
        let pending = PendingRequests::new();
        let status_waiters = StatusWaiters::default();
        let handler = Arc::new(ClientHandler {
            name: name.clone(),
            pending: pending.clone(),
            status_waiters: status_waiters.clone(),
        });
        let (outbox, queued) = mpsc::unbounded_channel();
        let link = Link::open(settings, handler, outbox, queued).await?;
        Ok(Self {
            name,
            link,
            pending,
            status_waiters,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Ask `agent_name` a question and wait for the answer, however long it
    /// takes. Survives reconnects.
    pub async fn query(&self, agent_name: &str, query: &str) -> Result<String, SuiteError> {
        let (_, reply) = self.send_query(agent_name, query).await?;
        reply.await.map_err(|_| SuiteError::Closed)?
    }

    /// Like [`query`](Self::query) but gives up after `timeout`, removing the
    /// pending entry.
    pub async fn query_timeout(&self, agent_name: &str, query: &str, timeout: Duration) -> Result<String, SuiteError> {
        let (request_id, reply) = self.send_query(agent_name, query).await?;
        match tokio::time::timeout(timeout, reply).await {
            Ok(reply) => reply.map_err(|_| SuiteError::Closed)?,
            Err(_) => {
                self.pending.remove(&request_id).await;
                warn!(agent = %agent_name, request_id = %request_id, "Query timed out");
                Err(SuiteError::Timeout { request_id, timeout })
            }
        }
    }

    async fn send_query(
        &self,
        agent_name: &str,
        query: &str,
    ) -> Result<(String, oneshot::Receiver<crate::correlation::Reply>), SuiteError> {
        let request_id = Uuid::new_v4().to_string();
        let reply = self.pending.register(request_id.clone()).await;
        debug!(agent = %agent_name, request_id = %request_id, "Sending query");
        let sent = self.link.send(SuiteMessage::ClientQuery {
            agent_name: agent_name.to_string(),
            query: query.to_string(),
            request_id: request_id.clone(),
        });
        if let Err(e) = sent {
            self.pending.remove(&request_id).await;
            return Err(e);
        }
        Ok((request_id, reply))
    }

    pub async fn status(&self) -> Result<SuiteStatus, SuiteError> {
        let (tx, rx) = oneshot::channel();
        self.status_waiters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(tx);
        self.link.send(SuiteMessage::status_request())?;
        rx.await.map_err(|_| SuiteError::Closed)
    }

    /// Queries still waiting for an answer.
    pub async fn pending_count(&self) -> usize {
        self.pending.len().await
    }

    pub async fn shutdown(self) {
        self.link.shutdown().await;
    }
}
