//! Multi-agent coordination over WebSocket.
//!
//! - [`server`] hosts the Suite: agents join by name, clients send queries,
//!   the [`SuiteHub`] routes each query to its agent and the answer back.
//! - [`SuiteClient`] sends queries and correlates responses by request id.
//! - [`AgentConnector`] joins an agent to a Suite and answers routed queries.
//! - [`http`] exposes one agent directly over HTTP.
//!
//! Clients and connectors reconnect with a fixed delay until shut down.

pub mod client;
pub mod connector;
pub mod correlation;
pub mod error;
pub mod heartbeat;
pub mod http;
pub mod hub;
mod link;
pub mod protocol;
pub mod server;

pub use client::{SuiteClient, SuiteStatus};
pub use connector::{AgentConnector, Responder};
pub use correlation::PendingRequests;
pub use error::SuiteError;
pub use hub::{ConnectionId, HubSettings, Outbound, SuiteHub};
pub use link::LinkSettings;
pub use protocol::SuiteMessage;
