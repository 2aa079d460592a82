//! `agentsuite run`: one task against a local agent.

use super::{AgentArgs, build_agent};
use agentsuite_config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(config: &AppConfig, args: &AgentArgs, task: &str, save: Option<&Path>, show_log: bool) -> Result<()> {
    let agent = build_agent(config, args).await?;
    let outcome = agent
        .run_with_log(task)
        .await
        .with_context(|| format!("Agent '{}' failed", agent.name()))?;

    if show_log {
        eprintln!("{}", serde_json::to_string_pretty(&outcome.log)?);
    }
    println!("{}", outcome.response);

    if let Some(dir) = save {
        let path = agentsuite_agent::persistence::save(&agent, dir).await?;
        eprintln!("Saved agent to {}", path.display());
    }
    Ok(())
}
