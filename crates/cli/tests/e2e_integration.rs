//! End-to-end tests across the agent, memory, workflow, and suite crates,
//! driven by scripted providers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentsuite_actions::default_catalogue;
use agentsuite_agent::{Agent, ReasonerKind};
use agentsuite_core::error::ProviderError;
use agentsuite_core::message::{Message, MessageToolCall, Role};
use agentsuite_core::provider::{Provider, ProviderRequest, ProviderResponse};
use agentsuite_memory::{FileVectorStore, HashingEmbedder, LongTermMemory, MemoryTiers, WorkingMemory};
use agentsuite_suite::server::serve_listener;
use agentsuite_suite::{AgentConnector, HubSettings, LinkSettings, SuiteClient, SuiteHub};
use agentsuite_workflow::{Pipeline, PipelineExecutor, PipelineTask};
use tokio::net::TcpListener;

/// Returns scripted responses in sequence and keeps every request.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let index = requests.len();
        assert!(index < responses.len(), "ScriptedProvider exhausted at call #{index}");
        requests.push(request);
        Ok(responses[index].clone())
    }
}

fn reply(message: Message) -> ProviderResponse {
    ProviderResponse {
        message,
        usage: None,
        model: "mock".into(),
    }
}

fn final_answer(text: &str) -> ProviderResponse {
    reply(Message::assistant(
        serde_json::json!({"response": text, "is_final": true}).to_string(),
    ))
}

fn tool_call(name: &str, args: serde_json::Value) -> ProviderResponse {
    reply(Message::assistant_with_tool_calls(
        "",
        vec![MessageToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments: args.to_string(),
        }],
    ))
}

#[tokio::test]
async fn calculator_tool_result_feeds_final_answer() {
    let provider = ScriptedProvider::new(vec![
        tool_call("calculator", serde_json::json!({"expression": "2 + 3 * 4"})),
        final_answer("14"),
    ]);
    let agent = Agent::builder("mathy", provider.clone())
        .action_set(agentsuite_actions::math())
        .build()
        .unwrap();

    assert_eq!(agent.run("what is 2 + 3 * 4?").await.unwrap(), "14");

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let tool_msg = requests[1]
        .messages
        .iter()
        .find(|m| m.role == Role::Tool)
        .expect("tool result sent back to the model");
    assert_eq!(tool_msg.content, "14");
}

#[tokio::test]
async fn pipeline_passes_outputs_between_real_agents() {
    let researcher = ScriptedProvider::new(vec![final_answer("Rust 1.0 shipped in 2015")]);
    let writer = ScriptedProvider::new(vec![final_answer("Summary done")]);

    let executor = PipelineExecutor::new()
        .with_agent("researcher", Arc::new(Agent::builder("researcher", researcher).build().unwrap()))
        .with_agent("writer", Arc::new(Agent::builder("writer", writer.clone()).build().unwrap()));

    let pipeline = Pipeline::from_tiers(vec![
        vec![PipelineTask::new("1", "researcher", "Rust history")],
        vec![PipelineTask::new("2", "writer", "Summarize").depends_on(["1"])],
    ]);
    let outputs = executor.execute(&pipeline).await.unwrap();
    assert_eq!(outputs["2"], "Summary done");

    let user_turn = writer.requests()[0]
        .messages
        .iter()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.clone())
        .unwrap();
    assert_eq!(user_turn, "Summarize\nRust 1.0 shipped in 2015");
}

#[tokio::test]
async fn suite_routes_query_to_real_agent() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let hub = Arc::new(SuiteHub::new(HubSettings::default()));
    tokio::spawn(serve_listener(listener, hub.clone()));

    let provider = ScriptedProvider::new(vec![final_answer("89F")]);
    let agent = Arc::new(Agent::builder("Weather", provider).build().unwrap());
    let settings = LinkSettings::new(&url).reconnect_delay(Duration::from_millis(50));
    let connector = AgentConnector::connect(agent, settings.clone()).await.unwrap();

    for _ in 0..200 {
        if hub.agent_names().await == vec!["Weather".to_string()] {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let client = SuiteClient::connect("e2e", settings).await.unwrap();
    let answer = client
        .query_timeout("Weather", "How hot is it?", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(answer, "89F");

    client.shutdown().await;
    connector.shutdown().await;
}

#[tokio::test]
async fn saved_agent_reloads_with_memory_and_actions() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = Arc::new(HashingEmbedder::default());
    let store = FileVectorStore::open("ltm", dir.path().join("ltm.jsonl"), embedder.clone())
        .await
        .unwrap();

    let provider = ScriptedProvider::new(vec![final_answer("noted")]);
    let agent = Agent::builder("keeper", provider)
        .instruction("Remember things")
        .reasoner(ReasonerKind::MemoryAware)
        .action_set(agentsuite_actions::clock())
        .memory(
            MemoryTiers::new()
                .with_working(WorkingMemory::new(4, 4))
                .with_long_term(Arc::new(LongTermMemory::new("ltm", Arc::new(store)))),
        )
        .build()
        .unwrap();
    agent.run("My favourite colour is teal").await.unwrap();
    {
        let state = agent.state().await;
        let ltm = state.memory.long_term().unwrap();
        ltm.insert(&agentsuite_core::memory::MemoryItem::text("favourite colour teal"))
            .await
            .unwrap();
    }
    agentsuite_agent::persistence::save(&agent, dir.path()).await.unwrap();

    let reloaded = agentsuite_agent::persistence::load(
        dir.path(),
        ScriptedProvider::new(vec![]),
        &default_catalogue(),
        embedder,
    )
    .await
    .unwrap();

    assert_eq!(reloaded.instruction(), "Remember things");
    assert_eq!(reloaded.reasoner_kind(), ReasonerKind::MemoryAware);
    assert_eq!(reloaded.action_names().await, vec!["current_time"]);

    let state = reloaded.state().await;
    let working = state.memory.working().unwrap();
    assert!(
        working
            .text_history()
            .any(|item| item.content.contains("favourite colour is teal"))
    );
    let recalled = state.memory.long_term().unwrap().recall("favourite colour teal", 1).await.unwrap();
    assert_eq!(recalled[0].content, "favourite colour teal");
}
