//! `agentsuite pipeline`: run a pipeline of local agents from a JSON file.
//!
//! ```json
//! {
//!   "agents": [
//!     {"name": "researcher", "instruction": "Find facts"},
//!     {"name": "writer", "instruction": "Write tersely", "reasoner": "memory_aware", "actions": []}
//!   ],
//!   "tiers": {
//!     "0": [{"id": "1", "agent": "researcher", "instruction": "Rust history"}],
//!     "1": [{"id": "2", "agent": "writer", "instruction": "Summarize", "depends_on": ["1"]}]
//!   }
//! }
//! ```

use super::{build_embedder, build_provider};
use agentsuite_agent::{Agent, ReasonerKind};
use agentsuite_config::AppConfig;
use agentsuite_core::provider::Provider;
use agentsuite_memory::{InMemoryVectorStore, LongTermMemory, MemoryTiers, WorkingMemory};
use agentsuite_workflow::{Pipeline, PipelineExecutor, PipelineTask};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reasoner: ReasonerKind,
    #[serde(default)]
    pub model: Option<String>,
    /// Prebuilt action set names.
    #[serde(default = "default_action_sets")]
    pub actions: Vec<String>,
}

fn default_action_sets() -> Vec<String> {
    vec!["math".into(), "clock".into()]
}

#[derive(Debug, Deserialize)]
pub struct PipelineFile {
    pub agents: Vec<AgentDefinition>,
    pub tiers: BTreeMap<u32, Vec<PipelineTask>>,
}

impl PipelineFile {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid pipeline file")
    }
}

pub fn build_executor(
    config: &AppConfig,
    definitions: &[AgentDefinition],
    provider: Arc<dyn Provider>,
    embedder: Arc<dyn agentsuite_core::memory::Embedder>,
) -> Result<PipelineExecutor> {
    let mut executor = PipelineExecutor::new();
    for def in definitions {
        let memory = MemoryTiers::new()
            .with_working(WorkingMemory::new(config.memory.max_text_items, config.memory.max_action_items))
            .with_long_term(Arc::new(LongTermMemory::new(
                format!("{}-long-term", def.name),
                Arc::new(InMemoryVectorStore::new(format!("{}-long-term", def.name), embedder.clone())),
            )));
        let mut builder = Agent::builder(&def.name, provider.clone())
            .configure(config)
            .description(&def.description)
            .instruction(&def.instruction)
            .reasoner(def.reasoner)
            .memory(memory);
        if let Some(model) = &def.model {
            builder = builder.model(model);
        }
        for set in &def.actions {
            let Some(actions) = agentsuite_actions::prebuilt_set(set) else {
                bail!("Agent '{}': unknown action set '{set}'", def.name);
            };
            builder = builder.action_set(actions);
        }
        executor.register(def.name.clone(), Arc::new(builder.build()?));
    }
    Ok(executor)
}

pub async fn run(config: &AppConfig, file: &Path) -> Result<()> {
    let json = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let definition = PipelineFile::parse(&json)?;

    let provider = build_provider(config)?;
    let embedder = build_embedder(config, provider.clone())?;
    let executor = build_executor(config, &definition.agents, provider, embedder)?;

    let pipeline = Pipeline {
        tiers: definition.tiers,
    };
    let outputs = executor.execute(&pipeline).await?;
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}
