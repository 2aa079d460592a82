//! Saving and restoring agents as `agent_profile.json`.
//!
//! Actions are stored by name and schema only. On load each name is
//! resolved against an [`ActionCatalogue`]; names the catalogue does not
//! know are skipped with a warning. Vector stores are referenced by
//! location and reopened, not copied.

use crate::agent::Agent;
use crate::reasoner::ReasonerKind;
use agentsuite_actions::ActionCatalogue;
use agentsuite_core::action::ActionSpec;
use agentsuite_core::error::{ActionError, MemoryError};
use agentsuite_core::memory::{Embedder, VectorStore};
use agentsuite_core::provider::Provider;
use agentsuite_memory::{
    FileVectorStore, InMemoryVectorStore, LongTermMemory, MemoryTiers, RecallLimits, SemanticMemory, WorkingMemory,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const PROFILE_FILE: &str = "agent_profile.json";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid agent profile: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Failed to reopen memory: {0}")]
    Memory(#[from] MemoryError),

    #[error("Failed to restore actions: {0}")]
    Action(#[from] ActionError),
}

/// Reference to a vector-store-backed memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct LimitsProfile {
    recent_text: usize,
    recent_actions: usize,
    long_term: usize,
    semantic: usize,
}

impl From<RecallLimits> for LimitsProfile {
    fn from(l: RecallLimits) -> Self {
        Self {
            recent_text: l.recent_text,
            recent_actions: l.recent_actions,
            long_term: l.long_term,
            semantic: l.semantic,
        }
    }
}

impl From<LimitsProfile> for RecallLimits {
    fn from(l: LimitsProfile) -> Self {
        Self {
            recent_text: l.recent_text,
            recent_actions: l.recent_actions,
            long_term: l.long_term,
            semantic: l.semantic,
        }
    }
}

/// On-disk form of an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instruction: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_turns: Option<u32>,
    #[serde(default)]
    pub reasoner: ReasonerKind,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_memory: Option<WorkingMemory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_term: Option<StoreRef>,
    #[serde(default)]
    pub semantic: Vec<StoreRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recall_limits: Option<LimitsProfile>,
}

fn default_temperature() -> f32 {
    0.7
}

impl AgentProfile {
    /// Snapshot an agent. Waits for any run in progress.
    pub async fn capture(agent: &Agent) -> Self {
        let state = agent.state().await;
        let memory = &state.memory;
        Self {
            name: agent.name().to_string(),
            description: agent.description().to_string(),
            instruction: agent.instruction().to_string(),
            model: agent.model().to_string(),
            temperature: agent.temperature(),
            max_turns: agent.max_turns(),
            reasoner: agent.reasoner_kind(),
            actions: state.registry.actions().into_iter().map(|a| a.spec().clone()).collect(),
            working_memory: memory.working().cloned(),
            long_term: memory.long_term().map(|ltm| StoreRef {
                name: ltm.name().to_string(),
                location: ltm.location().map(Path::to_path_buf),
            }),
            semantic: memory
                .semantic()
                .map(|sm| StoreRef {
                    name: sm.name().to_string(),
                    location: sm.location().map(Path::to_path_buf),
                })
                .collect(),
            recall_limits: Some(memory.limits().into()),
        }
    }
}

/// Write `agent_profile.json` into `dir`. Returns the file path.
pub async fn save(agent: &Agent, dir: &Path) -> Result<PathBuf, PersistenceError> {
    let profile = AgentProfile::capture(agent).await;
    let io_error = |source| PersistenceError::Io {
        path: dir.to_path_buf(),
        source,
    };
    tokio::fs::create_dir_all(dir).await.map_err(io_error)?;

    for store in profile.long_term.iter().chain(&profile.semantic) {
        if store.location.is_none() {
            warn!(agent = %profile.name, store = %store.name, "Memory store is in-memory only; its contents are not saved");
        }
    }

    let path = dir.join(PROFILE_FILE);
    let json = serde_json::to_string_pretty(&profile)?;
    tokio::fs::write(&path, json).await.map_err(|source| PersistenceError::Io {
        path: path.clone(),
        source,
    })?;
    info!(agent = %profile.name, path = %path.display(), "Agent saved");
    Ok(path)
}

/// Read the profile stored in `dir`.
pub async fn read_profile(dir: &Path) -> Result<AgentProfile, PersistenceError> {
    let path = dir.join(PROFILE_FILE);
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| PersistenceError::Io { path, source })?;
    Ok(serde_json::from_str(&content)?)
}

/// Rebuild an agent from `dir`.
pub async fn load(
    dir: &Path,
    provider: Arc<dyn Provider>,
    catalogue: &ActionCatalogue,
    embedder: Arc<dyn Embedder>,
) -> Result<Agent, PersistenceError> {
    let profile = read_profile(dir).await?;

    let mut memory = MemoryTiers::new();
    if let Some(working) = profile.working_memory {
        memory = memory.with_working(working);
    }
    if let Some(limits) = profile.recall_limits {
        memory = memory.with_limits(limits.into());
    }
    if let Some(store_ref) = &profile.long_term {
        let store = reopen_store(store_ref, embedder.clone()).await?;
        memory = memory.with_long_term(Arc::new(LongTermMemory::new(&store_ref.name, store)));
    }
    for store_ref in &profile.semantic {
        let store = reopen_store(store_ref, embedder.clone()).await?;
        memory = memory.with_semantic(Arc::new(SemanticMemory::new(&store_ref.name, store)));
    }

    let mut builder = Agent::builder(&profile.name, provider)
        .description(&profile.description)
        .instruction(&profile.instruction)
        .model(&profile.model)
        .temperature(profile.temperature)
        .max_turns(profile.max_turns)
        .reasoner(profile.reasoner)
        .memory(memory);

    for spec in &profile.actions {
        match catalogue.resolve(&spec.name) {
            Some(action) => builder = builder.action(action),
            None => warn!(agent = %profile.name, action = %spec.name, "Action not in catalogue; skipping"),
        }
    }

    let agent = builder.build()?;
    info!(agent = %agent.name(), dir = %dir.display(), "Agent loaded");
    Ok(agent)
}

async fn reopen_store(store_ref: &StoreRef, embedder: Arc<dyn Embedder>) -> Result<Arc<dyn VectorStore>, MemoryError> {
    match &store_ref.location {
        Some(path) => Ok(Arc::new(FileVectorStore::open(&store_ref.name, path, embedder).await?)),
        None => Ok(Arc::new(InMemoryVectorStore::new(&store_ref.name, embedder))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;
    use agentsuite_core::action::Action;
    use agentsuite_core::memory::MemoryItem;
    use agentsuite_memory::HashingEmbedder;
    use serde_json::json;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashingEmbedder::default())
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ltm_path = dir.path().join("memory").join("ltm.jsonl");

        let ltm_store = FileVectorStore::open("ltm", &ltm_path, embedder()).await.unwrap();
        let ltm = Arc::new(LongTermMemory::new("ltm", Arc::new(ltm_store)));
        ltm.insert(&MemoryItem::text("the user likes tea")).await.unwrap();

        let mut working = WorkingMemory::new(4, 2);
        working.add_text("[User Query] hello");
        working.add_action("Action: calculator | Args: {}");

        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let agent = Agent::builder("helper", provider.clone())
            .description("Does maths")
            .instruction("Be precise")
            .model("gpt-4o")
            .reasoner(ReasonerKind::MemoryAware)
            .action_set(agentsuite_actions::math())
            .action(Action::builder("secret").sync(|_| Ok(json!("hidden"))))
            .memory(
                MemoryTiers::new()
                    .with_working(working)
                    .with_long_term(ltm)
                    .with_semantic(Arc::new(SemanticMemory::new(
                        "kb",
                        Arc::new(InMemoryVectorStore::new("kb", embedder())),
                    ))),
            )
            .build()
            .unwrap();

        let path = save(&agent, dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join(PROFILE_FILE));

        let profile = read_profile(dir.path()).await.unwrap();
        assert_eq!(profile.actions.len(), 2);
        assert_eq!(profile.long_term.as_ref().unwrap().location.as_deref(), Some(ltm_path.as_path()));
        assert_eq!(profile.semantic[0].location, None);

        let catalogue = agentsuite_actions::default_catalogue();
        let restored = load(dir.path(), provider, &catalogue, embedder()).await.unwrap();
        assert_eq!(restored.name(), "helper");
        assert_eq!(restored.description(), "Does maths");
        assert_eq!(restored.instruction(), "Be precise");
        assert_eq!(restored.model(), "gpt-4o");
        assert_eq!(restored.reasoner_kind(), ReasonerKind::MemoryAware);
        assert_eq!(restored.action_names().await, vec!["calculator"]);

        let state = restored.state().await;
        let working = state.memory.working().unwrap();
        assert_eq!(working.max_text_items(), 4);
        assert_eq!(working.recent_text(1)[0].content, "[User Query] hello");
        assert_eq!(working.recent_actions(1)[0].content, "Action: calculator | Args: {}");

        let recalled = state.memory.long_term().unwrap().recall("tea", 1).await.unwrap();
        assert_eq!(recalled[0].content, "the user likes tea");
        assert!(state.memory.semantic_store("kb").is_some());
    }

    #[tokio::test]
    async fn missing_profile_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let err = load(dir.path(), provider, &ActionCatalogue::new(), embedder())
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Io { .. }));
    }

    #[tokio::test]
    async fn minimal_profile_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROFILE_FILE),
            r#"{"name": "tiny", "model": "gpt-4o-mini"}"#,
        )
        .unwrap();

        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let agent = load(dir.path(), provider, &ActionCatalogue::new(), embedder())
            .await
            .unwrap();
        assert_eq!(agent.reasoner_kind(), ReasonerKind::Basic);
        assert_eq!(agent.max_turns(), None);
        assert!(agent.state().await.memory.working().is_none());
    }
}
