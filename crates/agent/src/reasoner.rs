//! Reasoners: strategies that drive the shared loop.

use crate::engine::{LoopStyle, RunOutcome, Session, run_loop};
use agentsuite_core::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which reasoner an agent uses. Persisted with the agent profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonerKind {
    #[default]
    Basic,
    MemoryAware,
}

impl ReasonerKind {
    pub fn reasoner(self) -> Arc<dyn Reasoner> {
        match self {
            Self::Basic => Arc::new(BasicReasoner),
            Self::MemoryAware => Arc::new(MemoryAwareReasoner),
        }
    }
}

impl fmt::Display for ReasonerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Basic => "basic",
            Self::MemoryAware => "memory_aware",
        })
    }
}

#[async_trait]
pub trait Reasoner: Send + Sync {
    fn kind(&self) -> ReasonerKind;

    async fn run(&self, session: Session<'_>, task: &str) -> Result<RunOutcome>;
}

/// Tools and the answer contract only. Leaves memory untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicReasoner;

#[async_trait]
impl Reasoner for BasicReasoner {
    fn kind(&self) -> ReasonerKind {
        ReasonerKind::Basic
    }

    async fn run(&self, session: Session<'_>, task: &str) -> Result<RunOutcome> {
        let style = LoopStyle {
            include_memory_context: false,
            record_memory: false,
            nudge: "Go on!",
        };
        run_loop(session, task, style).await
    }
}

/// Puts the memory context in the prompt and records the query, tool
/// activity and final answer in working memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryAwareReasoner;

#[async_trait]
impl Reasoner for MemoryAwareReasoner {
    fn kind(&self) -> ReasonerKind {
        ReasonerKind::MemoryAware
    }

    async fn run(&self, session: Session<'_>, task: &str) -> Result<RunOutcome> {
        let style = LoopStyle {
            include_memory_context: true,
            record_memory: true,
            nudge: "Continue.",
        };
        run_loop(session, task, style).await
    }
}
