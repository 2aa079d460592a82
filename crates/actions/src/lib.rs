//! Prebuilt action sets for AgentSuite agents.
//!
//! - `math`: `calculator`
//! - `clock`: `current_time`
//!
//! [`default_catalogue`] contains every prebuilt action and is what
//! persisted agents are resolved against unless the caller supplies its own.

pub mod calculator;
pub mod catalogue;
pub mod clock;

use agentsuite_core::action::ActionSet;

pub use catalogue::ActionCatalogue;

pub fn math() -> ActionSet {
    ActionSet::new("math").with(calculator::action())
}

pub fn clock() -> ActionSet {
    ActionSet::new("clock").with(clock::action())
}

/// Look up a prebuilt set by name.
pub fn prebuilt_set(name: &str) -> Option<ActionSet> {
    match name {
        "math" => Some(math()),
        "clock" => Some(clock()),
        _ => None,
    }
}

pub fn default_catalogue() -> ActionCatalogue {
    let mut catalogue = ActionCatalogue::new();
    catalogue.register_set(&math()).register_set(&clock());
    catalogue
}
