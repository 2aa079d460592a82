//! `agentsuite init`: write the default config and create the memory directory.

use agentsuite_config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(config_path: Option<&Path>, force: bool) -> Result<()> {
    let default_path = AppConfig::config_path();
    let config_path = config_path.unwrap_or(&default_path);

    if let Some(dir) = config_path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    if config_path.exists() && !force {
        println!("Config already exists at {}", config_path.display());
        println!("Edit it by hand, or re-run with --force to overwrite.");
    } else {
        tokio::fs::write(config_path, AppConfig::default_toml())
            .await
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!("Wrote {}", config_path.display());
    }

    let config = AppConfig::load_from(config_path).context("The written config does not load")?;
    let data_dir = config.memory.data_dir();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    println!("Memory stores live in {}", data_dir.display());

    if !config.has_api_key() {
        println!();
        println!("No API key configured. Set AGENTSUITE_API_KEY or OPENAI_API_KEY,");
        println!("or add `api_key` to {}.", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        run(Some(&path), false).await.unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.suite.port, 8001);
    }

    #[tokio::test]
    async fn keeps_existing_config_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_model = \"custom\"\n").unwrap();

        run(Some(&path), false).await.unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().default_model, "custom");

        run(Some(&path), true).await.unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().default_model, "gpt-4o-mini");
    }
}
