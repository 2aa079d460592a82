//! `agentsuite serve`: expose one agent at `POST /{name}`.

use super::{AgentArgs, build_agent};
use agentsuite_config::AppConfig;
use agentsuite_suite::http::serve_agent;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;

pub async fn run(config: &AppConfig, args: &AgentArgs, host: Option<String>, port: Option<u16>) -> Result<()> {
    let agent = Arc::new(build_agent(config, args).await?);
    let host = host.unwrap_or_else(|| config.http.host.clone());
    let port = port.unwrap_or(config.http.port);
    let addr = format!("{host}:{port}");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    println!("Agent '{}' listening on http://{addr}/{}", agent.name(), agent.name());
    serve_agent(listener, agent).await?;
    Ok(())
}
