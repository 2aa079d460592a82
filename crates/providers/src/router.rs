//! Named provider lookup built from the `[providers]` config table.

use crate::openai_compat::OpenAiCompatProvider;
use agentsuite_config::AppConfig;
use agentsuite_core::provider::Provider;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Well-known OpenAI-compatible endpoints, used when a provider entry has
/// no `api_url`.
const KNOWN_ENDPOINTS: &[(&str, &str)] = &[
    ("openai", "https://api.openai.com/v1"),
    ("openrouter", "https://openrouter.ai/api/v1"),
    ("ollama", "http://localhost:11434/v1"),
    ("groq", "https://api.groq.com/openai/v1"),
    ("together", "https://api.together.xyz/v1"),
    ("deepseek", "https://api.deepseek.com/v1"),
    ("vllm", "http://localhost:8000/v1"),
];

pub struct ProviderRouter {
    providers: BTreeMap<String, Arc<dyn Provider>>,
    default_name: String,
}

impl ProviderRouter {
    pub fn new(default_name: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            default_name: default_name.into(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) -> &mut Self {
        self.providers.insert(name.into(), provider);
        self
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.get(&self.default_name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// The named provider, or the default one when `name` is `None`.
    pub fn resolve(&self, name: Option<&str>) -> Option<Arc<dyn Provider>> {
        self.get(name.unwrap_or(&self.default_name))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

/// Register one OpenAI-compatible client per `[providers.<name>]` entry,
/// plus the default provider if the table does not mention it.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);
    let shared_key = config.api_key.clone().unwrap_or_default();

    for (name, entry) in &config.providers {
        let key = entry.api_key.clone().unwrap_or_else(|| shared_key.clone());
        let url = entry.api_url.clone().unwrap_or_else(|| endpoint_for(name));
        router.register(name.clone(), Arc::new(OpenAiCompatProvider::new(name, &url, &key)));
    }

    if router.get(&config.default_provider).is_none() {
        let name = &config.default_provider;
        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &endpoint_for(name), &shared_key)),
        );
    }

    debug!(providers = ?router.names(), default = %router.default_name, "Providers configured");
    router
}

fn endpoint_for(name: &str) -> String {
    KNOWN_ENDPOINTS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, url)| (*url).to_string())
        .unwrap_or_else(|| format!("https://{name}.api.example.com/v1"))
}
