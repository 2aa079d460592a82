//! `agentsuite join`: connect a local agent to a Suite until Ctrl+C.

use super::{AgentArgs, build_agent, link_settings};
use agentsuite_config::AppConfig;
use agentsuite_suite::AgentConnector;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub async fn run(config: &AppConfig, args: &AgentArgs, url: Option<String>) -> Result<()> {
    let agent = Arc::new(build_agent(config, args).await?);
    let settings = link_settings(config, url);
    let connector = AgentConnector::connect(agent, settings.clone())
        .await
        .with_context(|| format!("Failed to reach the Suite at {}", settings.url))?;
    println!("Agent '{}' joined {}. Press Ctrl+C to leave.", connector.name(), settings.url);

    tokio::signal::ctrl_c().await?;
    info!(agent = %connector.name(), "Leaving suite");
    connector.shutdown().await;
    Ok(())
}
