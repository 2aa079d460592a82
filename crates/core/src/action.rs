//! Actions: named callables the model can ask an agent to run.
//!
//! An [`Action`] binds a name, a description and a parameter schema to a
//! callable at registration time. The callable may be synchronous or
//! asynchronous; [`ActionRegistry::invoke`] hides the difference so the
//! reasoning loop always awaits the same signature.

use crate::error::ActionError;
use crate::provider::ToolDefinition;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::warn;

/// JSON type of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Schema entry for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

/// The serializable description of an action (everything but the callable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    pub strict: bool,
}

type SyncFn = dyn Fn(Value) -> Result<Value, String> + Send + Sync;
type AsyncFn = dyn Fn(Value) -> BoxFuture<'static, Result<Value, String>> + Send + Sync;

#[derive(Clone)]
enum Callable {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

/// A registered capability. Immutable once built.
#[derive(Clone)]
pub struct Action {
    spec: ActionSpec,
    callable: Callable,
}

impl Action {
    /// Start building an action with the given name.
    pub fn builder(name: impl Into<String>) -> ActionBuilder {
        ActionBuilder {
            spec: ActionSpec {
                name: name.into(),
                description: String::new(),
                parameters: BTreeMap::new(),
                strict: false,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn description(&self) -> &str {
        &self.spec.description
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParamSpec> {
        &self.spec.parameters
    }

    pub fn strict(&self) -> bool {
        self.spec.strict
    }

    pub fn is_async(&self) -> bool {
        matches!(self.callable, Callable::Async(_))
    }

    pub fn spec(&self) -> &ActionSpec {
        &self.spec
    }

    /// JSON Schema for the parameters object.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for (name, param) in &self.spec.parameters {
            properties.insert(
                name.clone(),
                serde_json::json!({
                    "type": param.param_type.as_str(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(name.clone()));
            }
        }

        let mut schema = serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        });
        if self.spec.strict {
            schema["additionalProperties"] = Value::Bool(false);
        }
        schema
    }

    /// Convert this action into a ToolDefinition for sending to the LLM.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.spec.name.clone(),
            description: self.spec.description.clone(),
            parameters: self.parameters_schema(),
            strict: self.spec.strict,
        }
    }

    /// One prompt line: `- name(city: string, units?: string): description`.
    pub fn describe(&self) -> String {
        let params: Vec<String> = self
            .spec
            .parameters
            .iter()
            .map(|(name, p)| {
                let marker = if p.required { "" } else { "?" };
                format!("{name}{marker}: {}", p.param_type.as_str())
            })
            .collect();
        format!(
            "- {}({}): {}",
            self.spec.name,
            params.join(", "),
            self.spec.description
        )
    }

    /// Run the callable after checking required arguments.
    pub async fn call(&self, arguments: Value) -> Result<Value, ActionError> {
        let arguments = match arguments {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other,
        };
        self.check_required(&arguments)?;

        let invocation = async {
            match &self.callable {
                Callable::Sync(f) => f(arguments),
                Callable::Async(f) => f(arguments).await,
            }
        };
        let outcome = AssertUnwindSafe(invocation).catch_unwind().await.unwrap_or_else(|payload| {
            let reason = panic_reason(payload.as_ref());
            warn!(action = %self.spec.name, reason = %reason, "Action panicked");
            Err(reason)
        });
        outcome.map_err(|reason| ActionError::Invocation {
            name: self.spec.name.clone(),
            reason,
        })
    }

    fn check_required(&self, arguments: &Value) -> Result<(), ActionError> {
        let missing: Vec<&str> = self
            .spec
            .parameters
            .iter()
            .filter(|(name, p)| p.required && arguments.get(name.as_str()).is_none())
            .map(|(name, _)| name.as_str())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ActionError::InvalidArguments {
                name: self.spec.name.clone(),
                reason: format!("missing required argument(s): {}", missing.join(", ")),
            })
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".into());
    format!("action panicked: {detail}")
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.spec.name)
            .field("parameters", &self.spec.parameters.keys().collect::<Vec<_>>())
            .field("strict", &self.spec.strict)
            .field("is_async", &self.is_async())
            .finish()
    }
}

/// Fluent construction of an [`Action`].
pub struct ActionBuilder {
    spec: ActionSpec,
}

impl ActionBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = description.into();
        self
    }

    pub fn param(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.spec.parameters.insert(
            name.into(),
            ParamSpec {
                param_type,
                description: description.into(),
                required,
            },
        );
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.spec.strict = strict;
        self
    }

    /// Finish with a synchronous callable.
    pub fn sync<F>(self, f: F) -> Action
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Action {
            spec: self.spec,
            callable: Callable::Sync(Arc::new(f)),
        }
    }

    /// Finish with an asynchronous callable.
    pub fn handler<F, Fut>(self, f: F) -> Action
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        let callable = move |args: Value| -> BoxFuture<'static, Result<Value, String>> {
            Box::pin(f(args))
        };
        Action {
            spec: self.spec,
            callable: Callable::Async(Arc::new(callable)),
        }
    }
}

/// Opaque receipt for a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionHandle {
    name: String,
}

impl ActionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A named, ordered group of actions merged wholesale into a registry.
#[derive(Debug, Clone)]
pub struct ActionSet {
    name: String,
    actions: Vec<Action>,
}

impl ActionSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an action. A same-named action is replaced in place.
    pub fn add(&mut self, action: Action) -> &mut Self {
        match self.actions.iter_mut().find(|a| a.name() == action.name()) {
            Some(slot) => {
                warn!(set = %self.name, action = %action.name(), "Replacing action in set");
                *slot = action;
            }
            None => self.actions.push(action),
        }
        self
    }

    pub fn with(mut self, action: Action) -> Self {
        self.add(action);
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// A registry of available actions.
///
/// The reasoning loop uses this to:
/// 1. Get tool definitions to send to the LLM
/// 2. Look up and invoke actions when the LLM requests them
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Action>,
    reject_overwrites: bool,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose `register` fails on a name collision.
    pub fn rejecting_overwrites() -> Self {
        Self {
            actions: HashMap::new(),
            reject_overwrites: true,
        }
    }

    pub fn rejects_overwrites(&self) -> bool {
        self.reject_overwrites
    }

    /// Register an action. Last registration wins unless overwrites are rejected.
    pub fn register(&mut self, action: Action) -> Result<ActionHandle, ActionError> {
        let name = action.name().to_string();
        if self.actions.contains_key(&name) {
            if self.reject_overwrites {
                return Err(ActionError::DuplicateName(name));
            }
            warn!(action = %name, "Action already registered; replacing previous definition");
        }
        self.actions.insert(name.clone(), action);
        Ok(ActionHandle { name })
    }

    /// Register every action of a set, in set order.
    pub fn merge(&mut self, set: ActionSet) -> Result<Vec<ActionHandle>, ActionError> {
        set.actions.into_iter().map(|a| self.register(a)).collect()
    }

    /// Get an action by name.
    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Registered actions sorted by name.
    pub fn actions(&self) -> Vec<&Action> {
        let mut actions: Vec<&Action> = self.actions.values().collect();
        actions.sort_by(|a, b| a.name().cmp(b.name()));
        actions
    }

    /// Sorted names of all registered actions.
    pub fn names(&self) -> Vec<&str> {
        self.actions().into_iter().map(|a| a.name()).collect()
    }

    /// Prompt-ready listing, one line per action, sorted by name.
    pub fn describe_all(&self) -> String {
        if self.actions.is_empty() {
            return "(none)".into();
        }
        self.actions()
            .into_iter()
            .map(Action::describe)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tool definitions for the tool-calling API, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.actions().into_iter().map(Action::to_definition).collect()
    }

    /// Invoke an action by name.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, ActionError> {
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| ActionError::UnknownAction(name.to_string()))?;
        action.call(arguments).await
    }
}
