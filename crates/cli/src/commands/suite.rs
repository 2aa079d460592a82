//! `agentsuite suite`: host a Suite.

use agentsuite_config::AppConfig;
use agentsuite_suite::server;
use anyhow::{Context, Result};

pub async fn run(config: &AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut suite = config.suite.clone();
    if let Some(host) = host {
        suite.host = host;
    }
    if let Some(port) = port {
        suite.port = port;
    }

    println!("Suite starting on ws://{}:{}", suite.host, suite.port);
    server::serve(&suite)
        .await
        .with_context(|| format!("Suite on {}:{} stopped", suite.host, suite.port))
}
