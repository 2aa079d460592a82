//! Error types for the AgentSuite domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for agent runs.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Action errors ---
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    // --- Loop safety valve ---
    #[error("Turn limit exceeded: no final answer after {limit} model turns")]
    TurnLimitExceeded { limit: u32 },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Failed to fetch source {source_ref}: {reason}")]
    SourceFetch { source_ref: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error("No action named '{0}' is registered")]
    UnknownAction(String),

    #[error("Action '{name}' failed: {reason}")]
    Invocation { name: String, reason: String },

    #[error("Action '{0}' is already registered")]
    DuplicateName(String),

    #[error("Invalid arguments for '{name}': {reason}")]
    InvalidArguments { name: String, reason: String },
}
