//! Subcommand implementations and the agent wiring they share.

pub mod init;
pub mod join;
pub mod pipeline;
pub mod query;
pub mod run;
pub mod serve;
pub mod status;
pub mod suite;

use agentsuite_agent::{Agent, ReasonerKind};
use agentsuite_config::AppConfig;
use agentsuite_core::memory::{Embedder, VectorStore};
use agentsuite_core::provider::Provider;
use agentsuite_memory::{
    FileVectorStore, HashingEmbedder, InMemoryVectorStore, LongTermMemory, MemoryTiers, ProviderEmbedder,
    RecallLimits, SemanticMemory, TextSplitter, WorkingMemory, always_promote, never_promote,
};
use agentsuite_suite::LinkSettings;
use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Name of the semantic store `--ingest` feeds.
pub const KNOWLEDGE_STORE: &str = "knowledge";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReasonerArg {
    Basic,
    MemoryAware,
}

impl From<ReasonerArg> for ReasonerKind {
    fn from(arg: ReasonerArg) -> Self {
        match arg {
            ReasonerArg::Basic => ReasonerKind::Basic,
            ReasonerArg::MemoryAware => ReasonerKind::MemoryAware,
        }
    }
}

/// How to build the local agent a command runs.
#[derive(Args, Debug, Clone)]
pub struct AgentArgs {
    /// Agent name
    #[arg(long, default_value = "assistant")]
    pub name: String,

    /// Instruction placed in the system prompt
    #[arg(long, default_value = "")]
    pub instruction: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, value_enum, default_value_t = ReasonerArg::Basic)]
    pub reasoner: ReasonerArg,

    /// Prebuilt action sets to attach
    #[arg(long, value_delimiter = ',', default_values = ["math", "clock"])]
    pub actions: Vec<String>,

    /// Keep long-term and semantic memory in files under the memory data dir
    #[arg(long)]
    pub persist: bool,

    /// Copy items evicted from working memory into long-term memory
    #[arg(long)]
    pub promote: bool,

    /// Text, URL, or file to ingest into semantic memory first (repeatable)
    #[arg(long)]
    pub ingest: Vec<String>,

    /// Load a saved agent from this directory; the options above except
    /// `--ingest` are ignored
    #[arg(long)]
    pub profile: Option<PathBuf>,
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_with_env(path).with_context(|| format!("Failed to load config {}", path.display())),
        None => AppConfig::load().context("Failed to load config"),
    }
}

pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn Provider>> {
    agentsuite_providers::build_from_config(config)
        .resolve(None)
        .with_context(|| format!("Provider '{}' is not configured", config.default_provider))
}

pub fn build_embedder(config: &AppConfig, provider: Arc<dyn Provider>) -> Result<Arc<dyn Embedder>> {
    let memory = &config.memory;
    if memory.embedding_provider == "hashing" {
        return Ok(Arc::new(HashingEmbedder::new(memory.embedding_dimensions)));
    }
    let embedding_provider = if memory.embedding_provider == config.default_provider {
        provider
    } else {
        agentsuite_providers::build_from_config(config)
            .resolve(Some(&memory.embedding_provider))
            .with_context(|| format!("Embedding provider '{}' is not configured", memory.embedding_provider))?
    };
    Ok(Arc::new(ProviderEmbedder::new(
        embedding_provider,
        &memory.embedding_model,
        memory.embedding_dimensions,
    )))
}

async fn open_store(
    config: &AppConfig,
    name: String,
    persist: bool,
    embedder: Arc<dyn Embedder>,
) -> Result<Arc<dyn VectorStore>> {
    if !persist {
        return Ok(Arc::new(InMemoryVectorStore::new(name, embedder)));
    }
    let path = config.memory.data_dir().join(format!("{name}.jsonl"));
    let store = FileVectorStore::open(name, &path, embedder)
        .await
        .with_context(|| format!("Failed to open memory store {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Working, long-term, and semantic memory sized from config.
pub async fn build_memory(
    config: &AppConfig,
    agent_name: &str,
    args: &AgentArgs,
    embedder: Arc<dyn Embedder>,
) -> Result<MemoryTiers> {
    let memory = &config.memory;
    let long_term = open_store(config, format!("{agent_name}-long-term"), args.persist, embedder.clone()).await?;
    let semantic = open_store(config, format!("{agent_name}-{KNOWLEDGE_STORE}"), args.persist, embedder).await?;

    Ok(MemoryTiers::new()
        .with_working(WorkingMemory::new(memory.max_text_items, memory.max_action_items))
        .with_long_term(Arc::new(LongTermMemory::new(format!("{agent_name}-long-term"), long_term)))
        .with_semantic(Arc::new(
            SemanticMemory::new(KNOWLEDGE_STORE, semantic)
                .with_splitter(TextSplitter::new(memory.chunk_size, memory.chunk_overlap)),
        ))
        .with_limits(RecallLimits {
            recent_text: memory.recall.recent_text,
            recent_actions: memory.recall.recent_actions,
            long_term: memory.recall.long_term,
            semantic: memory.recall.semantic,
        })
        .with_promotion(if args.promote { always_promote() } else { never_promote() }))
}

/// Build the agent described by `args`, or load it from `--profile`.
pub async fn build_agent(config: &AppConfig, args: &AgentArgs) -> Result<Agent> {
    let provider = build_provider(config)?;
    let embedder = build_embedder(config, provider.clone())?;

    let agent = match &args.profile {
        Some(dir) => agentsuite_agent::persistence::load(dir, provider, &agentsuite_actions::default_catalogue(), embedder)
            .await
            .with_context(|| format!("Failed to load agent from {}", dir.display()))?,
        None => {
            let mut builder = Agent::builder(&args.name, provider)
                .configure(config)
                .description(&args.description)
                .instruction(&args.instruction)
                .reasoner(args.reasoner.into())
                .memory(build_memory(config, &args.name, args, embedder).await?);
            for name in &args.actions {
                let Some(set) = agentsuite_actions::prebuilt_set(name) else {
                    bail!("Unknown action set '{name}' (available: math, clock)");
                };
                builder = builder.action_set(set);
            }
            builder.build()?
        }
    };

    ingest(&agent, &args.ingest).await?;
    Ok(agent)
}

async fn ingest(agent: &Agent, sources: &[String]) -> Result<()> {
    if sources.is_empty() {
        return Ok(());
    }
    let store = {
        let state = agent.state().await;
        state
            .memory
            .semantic_store(KNOWLEDGE_STORE)
            .or_else(|| state.memory.semantic().next())
            .cloned()
    };
    let Some(store) = store else {
        bail!("Agent '{}' has no semantic memory to ingest into", agent.name());
    };
    for source in sources {
        let chunks = store
            .ingest(source)
            .await
            .with_context(|| format!("Failed to ingest {source}"))?;
        info!(agent = %agent.name(), store = %store.name(), chunks, "Ingested source");
    }
    Ok(())
}

pub fn link_settings(config: &AppConfig, url: Option<String>) -> LinkSettings {
    let mut settings = LinkSettings::from_config(&config.client);
    if let Some(url) = url {
        settings.url = url;
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        agent: AgentArgs,
    }

    fn args(extra: &[&str]) -> AgentArgs {
        let mut argv = vec!["test"];
        argv.extend_from_slice(extra);
        Wrapper::try_parse_from(argv).unwrap().agent
    }

    #[tokio::test]
    async fn builds_default_agent() {
        let config = AppConfig::default();
        let agent = build_agent(&config, &args(&["--name", "helper"])).await.unwrap();
        assert_eq!(agent.name(), "helper");
        assert_eq!(agent.action_names().await, vec!["calculator", "current_time"]);
        assert!(agent.state().await.memory.semantic_store(KNOWLEDGE_STORE).is_some());
    }

    #[tokio::test]
    async fn unknown_action_set_is_an_error() {
        let config = AppConfig::default();
        let err = build_agent(&config, &args(&["--actions", "weather"])).await.unwrap_err();
        assert!(err.to_string().contains("weather"));
    }

    #[tokio::test]
    async fn ingest_feeds_semantic_memory() {
        let config = AppConfig::default();
        let agent = build_agent(&config, &args(&["--ingest", "Rust has no garbage collector."]))
            .await
            .unwrap();
        let state = agent.state().await;
        let store = state.memory.semantic_store(KNOWLEDGE_STORE).unwrap();
        let hits = store.recall("garbage collector", 1).await.unwrap();
        assert_eq!(hits[0].text, "Rust has no garbage collector.");
    }

    #[tokio::test]
    async fn persisted_stores_live_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.memory.data_dir = Some(dir.path().to_path_buf());
        let agent = build_agent(&config, &args(&["--name", "keeper", "--persist", "--ingest", "remember this"]))
            .await
            .unwrap();
        assert_eq!(agent.name(), "keeper");
        assert!(dir.path().join("keeper-knowledge.jsonl").exists());
    }

    #[test]
    fn url_override() {
        let config = AppConfig::default();
        assert_eq!(link_settings(&config, None).url, "ws://localhost:8001");
        assert_eq!(link_settings(&config, Some("ws://x:1".into())).url, "ws://x:1");
    }
}
