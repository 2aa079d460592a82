//! # AgentSuite Core
//!
//! Domain types, traits, and error definitions for the AgentSuite agent runtime.
//! Every other crate depends on this one. The pluggable pieces (completion
//! provider, embedder, vector store) are traits here and are implemented in
//! `agentsuite-providers` and `agentsuite-memory`.

pub mod action;
pub mod error;
pub mod memory;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use action::{Action, ActionHandle, ActionRegistry, ActionSet, ActionSpec, ParamSpec, ParamType};
pub use error::{ActionError, Error, MemoryError, ProviderError, Result};
pub use memory::{Embedder, MemoryItem, MemoryKind, Metadata, SearchHit, VectorStore};
pub use message::{Message, MessageToolCall, Role, TurnLog};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ResponseFormat, ToolDefinition};
