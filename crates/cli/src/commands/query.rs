//! `agentsuite query`: ask a Suite-connected agent.

use super::link_settings;
use agentsuite_config::AppConfig;
use agentsuite_suite::SuiteClient;
use anyhow::{Context, Result};
use std::time::Duration;

pub async fn run(
    config: &AppConfig,
    client_name: &str,
    agent: &str,
    query: &str,
    url: Option<String>,
    timeout: Option<u64>,
) -> Result<()> {
    let settings = link_settings(config, url);
    let client = SuiteClient::connect(client_name, settings.clone())
        .await
        .with_context(|| format!("Failed to reach the Suite at {}", settings.url))?;

    let timeout = timeout.map(Duration::from_secs).or_else(|| config.client.query_timeout());
    let answer = match timeout {
        Some(limit) => client.query_timeout(agent, query, limit).await,
        None => client.query(agent, query).await,
    };
    client.shutdown().await;

    let answer = answer.with_context(|| format!("Query to '{agent}' failed"))?;
    println!("{answer}");
    Ok(())
}
