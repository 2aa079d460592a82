//! The agent: one action registry, optional memory tiers and a reasoner.

use crate::engine::{RunOutcome, Session};
use crate::reasoner::{Reasoner, ReasonerKind};
use agentsuite_config::AppConfig;
use agentsuite_core::action::{Action, ActionHandle, ActionRegistry, ActionSet};
use agentsuite_core::error::{ActionError, Result};
use agentsuite_core::provider::Provider;
use agentsuite_memory::MemoryTiers;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Mutable agent state. Locked for the whole of a run, so concurrent
/// queries to one agent are served one at a time in arrival order.
pub struct AgentState {
    pub registry: ActionRegistry,
    pub memory: MemoryTiers,
}

pub struct Agent {
    name: String,
    description: String,
    instruction: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_turns: Option<u32>,
    provider: Arc<dyn Provider>,
    reasoner: Arc<dyn Reasoner>,
    state: Mutex<AgentState>,
}

impl Agent {
    pub fn builder(name: impl Into<String>, provider: Arc<dyn Provider>) -> AgentBuilder {
        AgentBuilder::new(name, provider)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_turns(&self) -> Option<u32> {
        self.max_turns
    }

    pub fn reasoner_kind(&self) -> ReasonerKind {
        self.reasoner.kind()
    }

    /// Run a task and return the final answer.
    pub async fn run(&self, task: &str) -> Result<String> {
        Ok(self.run_with_log(task).await?.response)
    }

    /// Run a task and return the answer with the full turn log.
    pub async fn run_with_log(&self, task: &str) -> Result<RunOutcome> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let session = Session {
            agent_name: &self.name,
            instruction: &self.instruction,
            model: &self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_turns: self.max_turns,
            provider: &self.provider,
            registry: &state.registry,
            memory: &mut state.memory,
        };
        self.reasoner.run(session, task).await
    }

    /// Register an action after construction. Waits for any run in progress.
    pub async fn register_action(&self, action: Action) -> std::result::Result<ActionHandle, ActionError> {
        self.state.lock().await.registry.register(action)
    }

    pub async fn add_action_set(&self, set: ActionSet) -> std::result::Result<Vec<ActionHandle>, ActionError> {
        self.state.lock().await.registry.merge(set)
    }

    pub async fn action_names(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.registry.names().into_iter().map(String::from).collect()
    }

    /// Exclusive access to the registry and memory tiers.
    pub async fn state(&self) -> MutexGuard<'_, AgentState> {
        self.state.lock().await
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("reasoner", &self.reasoner.kind())
            .field("max_turns", &self.max_turns)
            .finish_non_exhaustive()
    }
}

pub struct AgentBuilder {
    name: String,
    description: String,
    instruction: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_turns: Option<u32>,
    provider: Arc<dyn Provider>,
    reasoner: Arc<dyn Reasoner>,
    reject_duplicate_actions: bool,
    actions: Vec<Action>,
    sets: Vec<ActionSet>,
    memory: MemoryTiers,
}

impl AgentBuilder {
    fn new(name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: None,
            max_turns: Some(25),
            provider,
            reasoner: ReasonerKind::Basic.reasoner(),
            reject_duplicate_actions: false,
            actions: Vec::new(),
            sets: Vec::new(),
            memory: MemoryTiers::new(),
        }
    }

    /// Take model, sampling and loop settings from configuration.
    pub fn configure(mut self, config: &AppConfig) -> Self {
        self.model = config.default_model.clone();
        self.temperature = config.default_temperature;
        self.max_tokens = config.default_max_tokens;
        self.max_turns = config.agent.turn_limit();
        self.reject_duplicate_actions = config.agent.reject_duplicate_actions;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// `None` lets the loop run until the model gives a final answer.
    pub fn max_turns(mut self, max_turns: Option<u32>) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn reasoner(mut self, kind: ReasonerKind) -> Self {
        self.reasoner = kind.reasoner();
        self
    }

    pub fn custom_reasoner(mut self, reasoner: Arc<dyn Reasoner>) -> Self {
        self.reasoner = reasoner;
        self
    }

    pub fn reject_duplicate_actions(mut self, reject: bool) -> Self {
        self.reject_duplicate_actions = reject;
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn action_set(mut self, set: ActionSet) -> Self {
        self.sets.push(set);
        self
    }

    pub fn memory(mut self, memory: MemoryTiers) -> Self {
        self.memory = memory;
        self
    }

    /// Register actions and sets in the order given. Fails only when
    /// duplicates are rejected.
    pub fn build(self) -> std::result::Result<Agent, ActionError> {
        let mut registry = if self.reject_duplicate_actions {
            ActionRegistry::rejecting_overwrites()
        } else {
            ActionRegistry::new()
        };
        for set in self.sets {
            debug!(agent = %self.name, set = %set.name(), "Merging action set");
            registry.merge(set)?;
        }
        for action in self.actions {
            registry.register(action)?;
        }

        info!(
            agent = %self.name,
            model = %self.model,
            reasoner = %self.reasoner.kind(),
            actions = registry.len(),
            "Agent created"
        );

        Ok(Agent {
            name: self.name,
            description: self.description,
            instruction: self.instruction,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_turns: self.max_turns,
            provider: self.provider,
            reasoner: self.reasoner,
            state: Mutex::new(AgentState {
                registry,
                memory: self.memory,
            }),
        })
    }
}
