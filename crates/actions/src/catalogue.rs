//! Action catalogue: resolves action names back to callables.
//!
//! Persisted agents store action names only; on load each name is looked
//! up here.

use agentsuite_core::action::{Action, ActionSet};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct ActionCatalogue {
    actions: BTreeMap<String, Action>,
}

impl ActionCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action. A later action with the same name replaces the earlier one.
    pub fn register(&mut self, action: Action) -> &mut Self {
        if let Some(previous) = self.actions.insert(action.name().to_string(), action) {
            warn!(action = %previous.name(), "Catalogue entry replaced");
        }
        self
    }

    pub fn register_set(&mut self, set: &ActionSet) -> &mut Self {
        for action in set.actions() {
            self.register(action.clone());
        }
        self
    }

    pub fn resolve(&self, name: &str) -> Option<Action> {
        self.actions.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
