//! `agentsuite status`: configuration summary, plus a live Suite check.

use super::link_settings;
use agentsuite_config::AppConfig;
use agentsuite_suite::SuiteClient;
use anyhow::{Context, Result};

pub async fn run(config: &AppConfig, suite_url: Option<String>) -> Result<()> {
    let config_path = AppConfig::config_path();

    println!("AgentSuite Status");
    println!("=================");
    println!("  Config file:  {}", config_path.display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.default_model);
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Max turns:    {}", config.agent.turn_limit().map_or("unbounded".to_string(), |t| t.to_string()));
    println!(
        "  Memory:       {} text / {} actions, embeddings: {}",
        config.memory.max_text_items, config.memory.max_action_items, config.memory.embedding_provider
    );
    println!("  Data dir:     {}", config.memory.data_dir().display());
    println!("  Suite:        {}:{} (heartbeat {}s)", config.suite.host, config.suite.port, config.suite.heartbeat_interval_secs);
    println!("  Client URL:   {}", config.client.suite_url);

    if !config_path.exists() {
        println!("\n  No config file; run `agentsuite init` first");
    }

    if let Some(url) = suite_url {
        let settings = link_settings(config, Some(url));
        let client = SuiteClient::connect("agentsuite-status", settings.clone())
            .await
            .with_context(|| format!("Failed to reach the Suite at {}", settings.url))?;
        let status = client.status().await;
        client.shutdown().await;
        let status = status.context("Suite did not answer the status request")?;

        println!();
        println!("  Suite uptime: {}s", status.uptime_secs);
        println!("  Clients:      {}", status.clients);
        if status.agents.is_empty() {
            println!("  Agents:       (none)");
        } else {
            println!("  Agents:       {}", status.agents.join(", "));
        }
    }
    Ok(())
}
