//! Scripted providers for agent tests.

use agentsuite_core::error::ProviderError;
use agentsuite_core::message::{Message, MessageToolCall};
use agentsuite_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// Returns scripted responses in order and records every request.
///
/// Panics if called more times than it has responses.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A single final answer.
    pub fn final_answer(text: &str) -> Self {
        Self::new(vec![answer(text, true)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let index = requests.len();
        assert!(
            index < responses.len(),
            "SequentialMockProvider: no more responses (call #{index}, have {})",
            responses.len()
        );
        requests.push(request);
        Ok(responses[index].clone())
    }
}

fn response(message: Message) -> ProviderResponse {
    ProviderResponse {
        message,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// An assistant message following the answer contract.
pub fn answer(text: &str, is_final: bool) -> ProviderResponse {
    let content = serde_json::json!({"response": text, "is_final": is_final}).to_string();
    response(Message::assistant(content))
}

/// An assistant message with arbitrary content.
pub fn raw(content: &str) -> ProviderResponse {
    response(Message::assistant(content))
}

/// An assistant message requesting tool calls.
pub fn tool_calls(calls: Vec<MessageToolCall>) -> ProviderResponse {
    response(Message::assistant_with_tool_calls("", calls))
}

pub fn call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.into(),
        name: name.into(),
        arguments: args.to_string(),
    }
}
