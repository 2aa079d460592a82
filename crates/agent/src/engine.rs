//! The reasoning loop shared by every reasoner.
//!
//! `BUILD_CONTEXT → CALL_MODEL → (tools → CALL_MODEL | PARSE_FINAL) → DONE`

use crate::payload::FinalPayload;
use crate::prompt::system_prompt;
use agentsuite_core::action::ActionRegistry;
use agentsuite_core::error::{ActionError, Error, Result};
use agentsuite_core::message::{Message, MessageToolCall, TurnLog};
use agentsuite_core::provider::{Provider, ProviderRequest, ResponseFormat};
use agentsuite_memory::MemoryTiers;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything a reasoner needs for one run, borrowed from the agent.
pub struct Session<'a> {
    pub agent_name: &'a str,
    pub instruction: &'a str,
    pub model: &'a str,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub max_turns: Option<u32>,
    pub provider: &'a Arc<dyn Provider>,
    pub registry: &'a ActionRegistry,
    pub memory: &'a mut MemoryTiers,
}

/// How a reasoner drives the loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopStyle {
    /// Put the memory context block in the system prompt.
    pub include_memory_context: bool,
    /// Record the task, tool calls, results and final answer in working memory.
    pub record_memory: bool,
    /// User turn appended after a non-final answer.
    pub nudge: &'static str,
}

/// The answer and the full turn log of a run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub response: String,
    pub log: TurnLog,
    /// Number of model calls made.
    pub turns: u32,
}

/// Run the loop to completion.
pub async fn run_loop(session: Session<'_>, task: &str, style: LoopStyle) -> Result<RunOutcome> {
    let Session {
        agent_name,
        instruction,
        model,
        temperature,
        max_tokens,
        max_turns,
        provider,
        registry,
        memory,
    } = session;

    info!(agent = %agent_name, actions = registry.len(), "Starting run");

    let memory_context = if style.include_memory_context {
        Some(memory.build_context(task).await)
    } else {
        None
    };
    let system = system_prompt(agent_name, instruction, &registry.describe_all(), memory_context.as_deref());

    if style.record_memory && !task.trim().is_empty() {
        memory.record_text(format!("[User Query] {task}")).await?;
    }

    let mut log = TurnLog::new();
    log.push(Message::system(system));
    log.push(Message::user(task));

    let tools = registry.definitions();
    let mut turns: u32 = 0;

    loop {
        if let Some(limit) = max_turns
            && turns >= limit
        {
            warn!(agent = %agent_name, limit, "Turn limit reached without a final answer");
            return Err(Error::TurnLimitExceeded { limit });
        }
        turns += 1;
        debug!(agent = %agent_name, turn = turns, messages = log.len(), "Calling model");

        let request = ProviderRequest {
            model: model.to_string(),
            messages: log.messages().to_vec(),
            temperature,
            max_tokens,
            tools: tools.clone(),
            response_format: ResponseFormat::JsonObject,
        };
        let response = provider.complete(request).await?;
        let message = response.message;

        if !message.tool_calls.is_empty() {
            let calls = message.tool_calls.clone();
            log.push(message);
            execute_tools(agent_name, registry, memory, &calls, style.record_memory, &mut log).await?;
            continue;
        }

        let content = message.content.clone();
        log.push(message);

        let (payload, malformed) = FinalPayload::parse_lenient(&content);
        if let Some(malformed) = malformed {
            warn!(agent = %agent_name, turn = turns, reason = %malformed.reason, "Malformed model output");
        }

        if payload.is_final {
            if style.record_memory && !payload.response.trim().is_empty() {
                memory
                    .record_text(format!("[Assistant Final Answer] {}", payload.response))
                    .await?;
            }
            info!(agent = %agent_name, turns, "Run finished");
            return Ok(RunOutcome {
                response: payload.response,
                log,
                turns,
            });
        }

        log.push(Message::user(style.nudge));
    }
}

/// Run one batch of tool calls concurrently and append their results in
/// request order.
async fn execute_tools(
    agent_name: &str,
    registry: &ActionRegistry,
    memory: &mut MemoryTiers,
    calls: &[MessageToolCall],
    record: bool,
    log: &mut TurnLog,
) -> Result<()> {
    debug!(agent = %agent_name, count = calls.len(), "Executing tool calls");

    let parsed: Vec<std::result::Result<Value, ActionError>> = calls.iter().map(parse_arguments).collect();

    if record {
        for (call, args) in calls.iter().zip(&parsed) {
            let rendered = match args {
                Ok(value) => value.to_string(),
                Err(_) => call.arguments.clone(),
            };
            memory
                .record_action(format!("Action: {} | Args: {rendered}", call.name))
                .await?;
        }
    }

    let results = join_all(calls.iter().zip(parsed).map(|(call, args)| async move {
        match args {
            Ok(args) => registry.invoke(&call.name, args).await,
            Err(e) => Err(e),
        }
    }))
    .await;

    for (call, result) in calls.iter().zip(results) {
        let content = match result {
            Ok(value) => stringify(&value),
            Err(e) => {
                warn!(agent = %agent_name, action = %call.name, error = %e, "Action failed");
                error_message(&e)
            }
        };
        if record {
            memory
                .record_text(format!("ActionResult({}): {content}", call.name))
                .await?;
        }
        log.push(Message::tool_result(&call.id, content));
    }
    Ok(())
}

fn parse_arguments(call: &MessageToolCall) -> std::result::Result<Value, ActionError> {
    if call.arguments.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(&call.arguments).map_err(|e| ActionError::InvalidArguments {
        name: call.name.clone(),
        reason: format!("arguments are not valid JSON: {e}"),
    })
}

/// Strings are passed through raw; everything else is serialized.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn error_message(error: &ActionError) -> String {
    match error {
        ActionError::Invocation { reason, .. } | ActionError::InvalidArguments { reason, .. } => {
            format!("Error: {reason}")
        }
        other => format!("Error: {other}"),
    }
}
