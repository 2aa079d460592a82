//! Configuration loading, validation, and management for AgentSuite.
//!
//! Loads configuration from `~/.agentsuite/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.agentsuite/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default completion provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Optional cap on tokens per model reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Reasoning loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Memory tier settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Suite server settings
    #[serde(default)]
    pub suite: SuiteConfig,

    /// Client / agent connector settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Single-agent HTTP endpoint settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("suite", &self.suite)
            .field("client", &self.client)
            .field("http", &self.http)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model turns allowed per run; 0 disables the guard.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Fail registration on a duplicate action name instead of replacing.
    #[serde(default)]
    pub reject_duplicate_actions: bool,
}

fn default_max_turns() -> u32 {
    25
}

impl AgentConfig {
    /// The turn guard as the reasoning loop expects it.
    pub fn turn_limit(&self) -> Option<u32> {
        (self.max_turns > 0).then_some(self.max_turns)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            reject_duplicate_actions: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_history_size")]
    pub max_text_items: usize,

    #[serde(default = "default_history_size")]
    pub max_action_items: usize,

    /// Items pulled into the prompt from each source
    #[serde(default)]
    pub recall: RecallConfig,

    /// Target chunk length in characters for semantic ingestion
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default)]
    pub chunk_overlap: usize,

    /// `hashing` or the name of a configured provider
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Where file-backed stores live; defaults to `~/.agentsuite/memory`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_history_size() -> usize {
    10
}
fn default_chunk_size() -> usize {
    800
}
fn default_embedding_provider() -> String {
    "hashing".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_dimensions() -> usize {
    256
}

impl MemoryConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("memory"))
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_text_items: default_history_size(),
            max_action_items: default_history_size(),
            recall: RecallConfig::default(),
            chunk_size: default_chunk_size(),
            chunk_overlap: 0,
            embedding_provider: default_embedding_provider(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallConfig {
    #[serde(default = "default_recent")]
    pub recent_text: usize,
    #[serde(default = "default_recent")]
    pub recent_actions: usize,
    #[serde(default = "default_long_term_recall")]
    pub long_term: usize,
    #[serde(default = "default_semantic_recall")]
    pub semantic: usize,
}

fn default_recent() -> usize {
    5
}
fn default_long_term_recall() -> usize {
    3
}
fn default_semantic_recall() -> usize {
    2
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            recent_text: default_recent(),
            recent_actions: default_recent(),
            long_term: default_long_term_recall(),
            semantic: default_semantic_recall(),
        }
    }
}

/// What the Suite does when a second agent joins under a taken name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateNamePolicy {
    /// Keep the first agent; the joiner gets an error.
    #[default]
    Reject,
    /// Route the name to the newest connection.
    Replace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    #[serde(default)]
    pub duplicate_agent_names: DuplicateNamePolicy,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8001
}
fn default_heartbeat_interval() -> u64 {
    30
}

impl SuiteConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            duplicate_agent_names: DuplicateNamePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_suite_url")]
    pub suite_url: String,

    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    /// Give up on a routed query after this long; unset waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_timeout_secs: Option<u64>,
}

fn default_suite_url() -> String {
    "ws://localhost:8001".into()
}
fn default_reconnect_delay() -> u64 {
    5
}

impl ClientConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            suite_url: default_suite_url(),
            reconnect_delay_secs: default_reconnect_delay(),
            query_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.agentsuite/config.toml).
    ///
    /// Environment overrides:
    /// - `AGENTSUITE_API_KEY`, then `OPENAI_API_KEY` (when no key is configured)
    /// - `AGENTSUITE_PROVIDER`, `AGENTSUITE_MODEL`
    /// - `AGENTSUITE_SUITE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// [`load_from`](Self::load_from) plus the environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("AGENTSUITE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if let Ok(provider) = std::env::var("AGENTSUITE_PROVIDER") {
            self.default_provider = provider;
        }
        if let Ok(model) = std::env::var("AGENTSUITE_MODEL") {
            self.default_model = model;
        }
        if let Ok(url) = std::env::var("AGENTSUITE_SUITE_URL") {
            self.client.suite_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentsuite")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.memory.max_text_items == 0 || self.memory.max_action_items == 0 {
            return Err(ConfigError::ValidationError(
                "working memory sizes must be at least 1".into(),
            ));
        }

        if self.memory.chunk_size == 0 || self.memory.chunk_overlap >= self.memory.chunk_size {
            return Err(ConfigError::ValidationError(
                "chunk_size must be > 0 and larger than chunk_overlap".into(),
            ));
        }

        if self.memory.embedding_dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embedding_dimensions must be > 0".into(),
            ));
        }

        if self.suite.heartbeat_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "heartbeat_interval_secs must be > 0".into(),
            ));
        }

        if !(self.client.suite_url.starts_with("ws://") || self.client.suite_url.starts_with("wss://")) {
            return Err(ConfigError::ValidationError(format!(
                "suite_url must be a ws:// or wss:// URL, got '{}'",
                self.client.suite_url
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: None,
            agent: AgentConfig::default(),
            memory: MemoryConfig::default(),
            suite: SuiteConfig::default(),
            client: ClientConfig::default(),
            http: HttpConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.suite.port, 8001);
        assert_eq!(config.suite.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.memory.max_text_items, 10);
        assert_eq!(config.memory.recall.long_term, 3);
        assert_eq!(config.agent.turn_limit(), Some(25));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.suite.port, config.suite.port);
        assert_eq!(parsed.client.suite_url, config.client.suite_url);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
default_model = "gpt-4o"

[suite]
port = 9100
duplicate_agent_names = "replace"

[memory]
max_text_items = 3
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.suite.port, 9100);
        assert_eq!(config.suite.heartbeat_interval_secs, 30);
        assert_eq!(config.suite.duplicate_agent_names, DuplicateNamePolicy::Replace);
        assert_eq!(config.memory.max_text_items, 3);
        assert_eq!(config.memory.max_action_items, 10);
    }

    #[test]
    fn zero_max_turns_disables_guard() {
        let config = AgentConfig {
            max_turns: 0,
            ..AgentConfig::default()
        };
        assert_eq!(config.turn_limit(), None);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let mut config = AppConfig::default();
        config.memory.chunk_overlap = config.memory.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn suite_url_must_be_websocket() {
        let mut config = AppConfig::default();
        config.client.suite_url = "http://localhost:8001".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn load_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "suite = 12").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("8001"));
        assert!(toml_str.contains("heartbeat_interval_secs"));
    }
}
