//! Agents and the reasoning loop.
//!
//! An [`Agent`] owns an action registry and optional memory tiers and runs
//! tasks through a [`Reasoner`]:
//!
//! 1. **Build context**: system prompt with instruction, tools and (for the
//!    memory-aware reasoner) recalled memory
//! 2. **Call the model** with the turn log and tool schemas
//! 3. **Tool calls**: run them concurrently, append results in request
//!    order, call the model again
//! 4. **No tool calls**: parse `{response, is_final}`; stop when final,
//!    otherwise nudge and loop
//!
//! The loop is bounded by a configurable turn limit.

pub mod agent;
pub mod engine;
pub mod payload;
pub mod persistence;
pub mod prompt;
pub mod reasoner;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use agent::{Agent, AgentBuilder, AgentState};
pub use engine::{LoopStyle, RunOutcome, Session};
pub use payload::{FinalPayload, MalformedModelOutput};
pub use persistence::{AgentProfile, PROFILE_FILE, PersistenceError, StoreRef};
pub use reasoner::{BasicReasoner, MemoryAwareReasoner, Reasoner, ReasonerKind};
