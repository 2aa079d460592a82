//! Pipeline executor: runs tiers of agent tasks.
//!
//! Tiers run strictly in ascending order. Tasks within a tier are spawned
//! concurrently, and a task's input is its instruction followed by the
//! outputs of the tasks it depends on.

pub mod executor;
pub mod pipeline;

use std::path::PathBuf;
use thiserror::Error;

pub use executor::{PipelineAgent, PipelineExecutor, PipelineOutputs};
pub use pipeline::{Pipeline, PipelineTask};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Task '{task}' names unknown agent '{agent}'")]
    UnknownAgent { task: String, agent: String },

    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: agentsuite_core::Error,
    },

    #[error("Pipeline task panicked or was cancelled: {0}")]
    Join(String),

    #[error("Invalid pipeline definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
