//! Completion provider implementations for AgentSuite.
//!
//! All providers implement the `agentsuite_core::Provider` trait.
//! [`build_from_config`] registers one client per configured provider.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
