use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SuiteError {
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The Suite could not deliver a query, or the agent reported a failure.
    #[error("Routing error: {0}")]
    Routing(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Link closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No response to request {request_id} within {timeout:?}")]
    Timeout { request_id: String, timeout: Duration },
}
