//! The Suite's connection, agent, and pending-request tables.
//!
//! All three tables sit behind one `RwLock`. Connection tasks talk to the hub
//! through [`SuiteHub::handle`] and receive outbound frames on the channel
//! they registered with.

use crate::protocol::SuiteMessage;
use agentsuite_config::{DuplicateNamePolicy, SuiteConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub type ConnectionId = u64;

/// A frame queued for one connection's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message(SuiteMessage),
    Ping,
    Close,
}

pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Connected but not yet identified.
    Pending,
    Agent(String),
    Client(String),
}

struct Connection {
    role: Role,
    sender: OutboundSender,
    last_pong: Instant,
}

/// A routed query waiting for its agent.
struct Route {
    client: ConnectionId,
    agent: ConnectionId,
    agent_name: String,
}

#[derive(Default)]
struct Tables {
    connections: HashMap<ConnectionId, Connection>,
    agents: HashMap<String, ConnectionId>,
    routes: HashMap<String, Route>,
}

impl Tables {
    fn send(&self, id: ConnectionId, message: SuiteMessage) -> bool {
        match self.connections.get(&id) {
            Some(conn) => conn.sender.send(Outbound::Message(message)).is_ok(),
            None => false,
        }
    }

    fn broadcast(&self, message: &SuiteMessage) {
        for (id, conn) in &self.connections {
            if conn.sender.send(Outbound::Message(message.clone())).is_err() {
                debug!(connection = id, "Broadcast skipped closed connection");
            }
        }
    }

    /// Fail every query routed to `agent` with `reason`.
    fn fail_routes_to(&mut self, agent: ConnectionId, reason: &str) {
        let orphaned: Vec<String> = self
            .routes
            .iter()
            .filter(|(_, route)| route.agent == agent)
            .map(|(request_id, _)| request_id.clone())
            .collect();
        for request_id in orphaned {
            if let Some(route) = self.routes.remove(&request_id) {
                self.send(route.client, SuiteMessage::error(reason, Some(request_id)));
            }
        }
    }

    /// Connection `id` no longer serves as agent `name`: unmap the name if
    /// `id` still holds it, fail its routed queries and announce the departure.
    fn release_agent(&mut self, id: ConnectionId, name: &str) {
        if self.agents.get(name) != Some(&id) {
            return;
        }
        self.agents.remove(name);
        self.fail_routes_to(id, &format!("Agent '{name}' disconnected before answering"));
        info!(agent = %name, connection = id, "Agent left");
        self.broadcast(&SuiteMessage::system(format!("{name} left the suite")));
    }
}

#[derive(Debug, Clone)]
pub struct HubSettings {
    pub heartbeat_interval: Duration,
    pub duplicate_names: DuplicateNamePolicy,
}

impl HubSettings {
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval(),
            duplicate_names: config.duplicate_agent_names,
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self::from_config(&SuiteConfig::default())
    }
}

pub struct SuiteHub {
    settings: HubSettings,
    tables: RwLock<Tables>,
    next_id: AtomicU64,
    started: Instant,
}

impl SuiteHub {
    pub fn new(settings: HubSettings) -> Self {
        Self {
            settings,
            tables: RwLock::new(Tables::default()),
            next_id: AtomicU64::new(1),
            started: Instant::now(),
        }
    }

    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }

    /// Add a fresh, unidentified connection.
    pub async fn register(&self, sender: OutboundSender) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.tables.write().await.connections.insert(
            id,
            Connection {
                role: Role::Pending,
                sender,
                last_pong: Instant::now(),
            },
        );
        debug!(connection = id, "Connection registered");
        id
    }

    pub async fn handle(&self, id: ConnectionId, message: SuiteMessage) {
        match message {
            SuiteMessage::Join { name } => self.join_agent(id, name).await,
            SuiteMessage::ClientJoin { client_name } => self.join_client(id, client_name).await,
            SuiteMessage::ClientQuery {
                agent_name,
                query,
                request_id,
            } => self.route_query(id, agent_name, query, request_id).await,
            SuiteMessage::AgentQueryResponse { request_id, result } => {
                self.complete(id, request_id, Ok(result)).await
            }
            SuiteMessage::Error {
                message,
                request_id: Some(request_id),
            } => self.complete(id, request_id, Err(message)).await,
            SuiteMessage::Status { .. } => {
                let status = self.status().await;
                self.tables.read().await.send(id, status);
            }
            other => {
                warn!(connection = id, kind = other.kind(), "Ignoring unexpected message");
            }
        }
    }

    async fn join_agent(&self, id: ConnectionId, name: String) {
        let mut tables = self.tables.write().await;
        if let Some(&holder) = tables.agents.get(&name)
            && holder != id
        {
            match self.settings.duplicate_names {
                DuplicateNamePolicy::Reject => {
                    warn!(agent = %name, connection = id, "Rejected duplicate agent name");
                    tables.send(id, SuiteMessage::error(format!("Agent name '{name}' is already taken"), None));
                    return;
                }
                DuplicateNamePolicy::Replace => {
                    info!(agent = %name, previous = holder, connection = id, "Replacing agent connection");
                    if let Some(previous) = tables.connections.get_mut(&holder) {
                        previous.role = Role::Pending;
                    }
                }
            }
        }

        let Some(conn) = tables.connections.get_mut(&id) else {
            return;
        };
        if let Role::Agent(old) = std::mem::replace(&mut conn.role, Role::Agent(name.clone()))
            && old != name
        {
            tables.release_agent(id, &old);
        }
        tables.agents.insert(name.clone(), id);
        info!(agent = %name, connection = id, "Agent joined");
        tables.broadcast(&SuiteMessage::system(format!("{name} joined the suite")));
    }

    async fn join_client(&self, id: ConnectionId, client_name: String) {
        let mut tables = self.tables.write().await;
        let Some(conn) = tables.connections.get_mut(&id) else {
            return;
        };
        if let Role::Agent(name) = std::mem::replace(&mut conn.role, Role::Client(client_name.clone())) {
            tables.release_agent(id, &name);
        }
        info!(client = %client_name, connection = id, "Client joined");
        tables.send(id, SuiteMessage::system(format!("Welcome, {client_name}")));
    }

    async fn route_query(&self, client: ConnectionId, agent_name: String, query: String, request_id: String) {
        let mut tables = self.tables.write().await;
        let Some(&agent) = tables.agents.get(&agent_name) else {
            warn!(agent = %agent_name, request_id = %request_id, "Query for unknown agent");
            tables.send(
                client,
                SuiteMessage::error(format!("Agent '{agent_name}' is not connected"), Some(request_id)),
            );
            return;
        };

        debug!(agent = %agent_name, request_id = %request_id, "Routing query");
        tables.routes.insert(
            request_id.clone(),
            Route {
                client,
                agent,
                agent_name: agent_name.clone(),
            },
        );
        if !tables.send(agent, SuiteMessage::AgentQuery { query, request_id: request_id.clone() }) {
            tables.routes.remove(&request_id);
            tables.send(
                client,
                SuiteMessage::error(format!("Agent '{agent_name}' is unreachable"), Some(request_id)),
            );
        }
    }

    /// Resolve a route and forward the agent's answer (or failure) to the
    /// waiting client.
    async fn complete(&self, from: ConnectionId, request_id: String, outcome: Result<String, String>) {
        let mut tables = self.tables.write().await;
        match tables.routes.get(&request_id) {
            None => {
                warn!(connection = from, request_id = %request_id, "Dropping response for unknown request");
                return;
            }
            Some(route) if route.agent != from => {
                warn!(connection = from, request_id = %request_id, "Dropping response from a connection the query was not routed to");
                return;
            }
            Some(_) => {}
        }
        let Some(route) = tables.routes.remove(&request_id) else {
            return;
        };

        debug!(agent = %route.agent_name, request_id = %request_id, ok = outcome.is_ok(), "Query answered");
        let reply = match outcome {
            Ok(result) => SuiteMessage::ClientQueryResponse { request_id, result },
            Err(message) => SuiteMessage::error(message, Some(request_id)),
        };
        if !tables.send(route.client, reply) {
            debug!(agent = %route.agent_name, "Client left before the response arrived");
        }
    }

    pub async fn record_pong(&self, id: ConnectionId) {
        if let Some(conn) = self.tables.write().await.connections.get_mut(&id) {
            conn.last_pong = Instant::now();
        }
    }

    pub async fn last_pong(&self, id: ConnectionId) -> Option<Instant> {
        self.tables.read().await.connections.get(&id).map(|c| c.last_pong)
    }

    /// Queue a raw frame for one connection. False if it is gone.
    pub async fn push(&self, id: ConnectionId, frame: Outbound) -> bool {
        match self.tables.read().await.connections.get(&id) {
            Some(conn) => conn.sender.send(frame).is_ok(),
            None => false,
        }
    }

    pub async fn send(&self, id: ConnectionId, message: SuiteMessage) -> bool {
        self.tables.read().await.send(id, message)
    }

    /// Remove a connection and clean up after it. Returns false if it was
    /// already gone.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let mut tables = self.tables.write().await;
        let Some(conn) = tables.connections.remove(&id) else {
            return false;
        };
        let _ = conn.sender.send(Outbound::Close);

        match conn.role {
            Role::Agent(name) => tables.release_agent(id, &name),
            Role::Client(name) => {
                tables.routes.retain(|_, route| route.client != id);
                info!(client = %name, connection = id, "Client left");
            }
            Role::Pending => debug!(connection = id, "Connection closed before joining"),
        }
        // A replaced or re-roled agent may still have queries routed to it.
        tables.fail_routes_to(id, "Agent disconnected before answering");
        true
    }

    /// Close every connection for a Suite shutdown. Tables are cleared
    /// without failing routed queries; clients keep them pending across the
    /// reconnect.
    pub async fn close_all(&self) -> usize {
        let mut tables = self.tables.write().await;
        tables.broadcast(&SuiteMessage::system("Suite shutting down"));
        let closed = tables.connections.len();
        for (_, conn) in tables.connections.drain() {
            let _ = conn.sender.send(Outbound::Close);
        }
        tables.agents.clear();
        tables.routes.clear();
        info!(connections = closed, "Closed all connections");
        closed
    }

    pub async fn broadcast(&self, message: SuiteMessage) {
        self.tables.read().await.broadcast(&message);
    }

    pub async fn status(&self) -> SuiteMessage {
        let tables = self.tables.read().await;
        let clients = tables
            .connections
            .values()
            .filter(|c| matches!(c.role, Role::Client(_)))
            .count();
        let mut agents: Vec<String> = tables.agents.keys().cloned().collect();
        agents.sort();
        SuiteMessage::Status {
            clients: Some(clients),
            agents: Some(agents),
            uptime_secs: Some(self.started.elapsed().as_secs()),
        }
    }

    pub async fn is_connected(&self, id: ConnectionId) -> bool {
        self.tables.read().await.connections.contains_key(&id)
    }

    pub async fn connection_count(&self) -> usize {
        self.tables.read().await.connections.len()
    }

    pub async fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().await.agents.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn pending_count(&self) -> usize {
        self.tables.read().await.routes.len()
    }
}
