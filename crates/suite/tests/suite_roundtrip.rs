use agentsuite_suite::server::{serve_listener, serve_until};
use agentsuite_suite::{
    AgentConnector, HubSettings, LinkSettings, Responder, SuiteClient, SuiteError, SuiteHub, SuiteMessage,
};
use async_trait::async_trait;
use futures::SinkExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;

struct Upper;

#[async_trait]
impl Responder for Upper {
    fn name(&self) -> &str {
        "Upper"
    }

    async fn respond(&self, query: &str) -> Result<String, agentsuite_core::Error> {
        if query == "stall" {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if query == "fail" {
            return Err(agentsuite_core::Error::Internal("cannot".into()));
        }
        Ok(query.to_uppercase())
    }
}

async fn start_suite() -> (Arc<SuiteHub>, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hub = Arc::new(SuiteHub::new(HubSettings::default()));
    tokio::spawn(serve_listener(listener, hub.clone()));
    (hub, format!("ws://{addr}"))
}

fn settings(url: &str) -> LinkSettings {
    LinkSettings::new(url).reconnect_delay(Duration::from_millis(50))
}

async fn wait_for_agent(hub: &SuiteHub, name: &str) {
    for _ in 0..200 {
        if hub.agent_names().await.iter().any(|n| n == name) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("agent {name} never joined");
}

#[tokio::test]
async fn client_query_reaches_agent_and_back() {
    let (hub, url) = start_suite().await;
    let connector = AgentConnector::connect(Arc::new(Upper), settings(&url)).await.unwrap();
    wait_for_agent(&hub, "Upper").await;

    let client = SuiteClient::connect("tester", settings(&url)).await.unwrap();
    let answer = client.query("Upper", "hello suite").await.unwrap();
    assert_eq!(answer, "HELLO SUITE");
    assert_eq!(client.pending_count().await, 0);

    let status = client.status().await.unwrap();
    assert_eq!(status.agents, vec!["Upper".to_string()]);
    assert_eq!(status.clients, 1);

    client.shutdown().await;
    connector.shutdown().await;
}

#[tokio::test]
async fn query_for_absent_agent_is_an_error() {
    let (_hub, url) = start_suite().await;
    let client = SuiteClient::connect("tester", settings(&url)).await.unwrap();

    let err = client.query("cow", "moo").await.unwrap_err();
    assert!(matches!(err, SuiteError::Routing(ref msg) if msg.contains("cow")));
    assert!(client.is_connected());
    client.shutdown().await;
}

#[tokio::test]
async fn agent_failure_becomes_routing_error() {
    let (hub, url) = start_suite().await;
    let connector = AgentConnector::connect(Arc::new(Upper), settings(&url)).await.unwrap();
    wait_for_agent(&hub, "Upper").await;
    let client = SuiteClient::connect("tester", settings(&url)).await.unwrap();

    let err = client.query("Upper", "fail").await.unwrap_err();
    assert!(matches!(err, SuiteError::Routing(ref msg) if msg.contains("cannot")));
    client.shutdown().await;
    connector.shutdown().await;
}

#[tokio::test]
async fn query_timeout_clears_pending_entry() {
    let (hub, url) = start_suite().await;
    let connector = AgentConnector::connect(Arc::new(Upper), settings(&url)).await.unwrap();
    wait_for_agent(&hub, "Upper").await;
    let client = SuiteClient::connect("tester", settings(&url)).await.unwrap();

    let err = client
        .query_timeout("Upper", "stall", Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, SuiteError::Timeout { .. }));
    assert_eq!(client.pending_count().await, 0);
    client.shutdown().await;
    connector.shutdown().await;
}

#[tokio::test]
async fn connector_departure_is_seen_by_suite() {
    let (hub, url) = start_suite().await;
    let connector = AgentConnector::connect(Arc::new(Upper), settings(&url)).await.unwrap();
    wait_for_agent(&hub, "Upper").await;

    connector.shutdown().await;
    for _ in 0..200 {
        if hub.agent_names().await.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("agent was never removed");
}

#[tokio::test]
async fn connect_fails_fast_when_suite_is_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = SuiteClient::connect("tester", settings(&format!("ws://{addr}")))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SuiteError::Transport(_)));
}

/// A Suite on `addr` that stops when the returned sender fires.
async fn start_stoppable_suite(addr: SocketAddr) -> (Arc<SuiteHub>, oneshot::Sender<()>, JoinHandle<std::io::Result<()>>) {
    let listener = TcpListener::bind(addr).await.unwrap();
    let hub = Arc::new(SuiteHub::new(HubSettings::default()));
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_until(listener, hub.clone(), async move {
        let _ = stopped.await;
    }));
    (hub, stop, server)
}

async fn wait_until<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..300 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn client_reconnects_after_suite_restart() {
    let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let url = format!("ws://{addr}");
    let (hub, stop, server) = start_stoppable_suite(addr).await;

    let connector = AgentConnector::connect(Arc::new(Upper), settings(&url)).await.unwrap();
    wait_for_agent(&hub, "Upper").await;
    let client = SuiteClient::connect("tester", settings(&url)).await.unwrap();

    let mut stalled = Box::pin(client.query("Upper", "stall"));
    assert!(tokio::time::timeout(Duration::from_millis(100), &mut stalled).await.is_err());
    assert_eq!(client.pending_count().await, 1);

    stop.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap().unwrap();
    wait_until("client to notice the drop", || async { !client.is_connected() }).await;
    assert_eq!(client.pending_count().await, 1);

    let (hub, _stop, _server) = start_stoppable_suite(addr).await;
    wait_until("client to reconnect", || async { client.is_connected() }).await;
    wait_for_agent(&hub, "Upper").await;

    let answer = client
        .query_timeout("Upper", "back again", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(answer, "BACK AGAIN");
    assert_eq!(client.pending_count().await, 1);

    drop(stalled);
    client.shutdown().await;
    connector.shutdown().await;
}

#[tokio::test]
async fn connector_claims_name_once_stale_holder_leaves() {
    let (hub, url) = start_suite().await;

    // A socket that joined as "Upper" and will never answer.
    let (mut stale, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    let join = SuiteMessage::Join { name: "Upper".into() }.to_json();
    stale.send(WsMessage::Text(join.into())).await.unwrap();
    wait_for_agent(&hub, "Upper").await;

    let connector = AgentConnector::connect(Arc::new(Upper), settings(&url)).await.unwrap();
    wait_until("both sockets to be connected", || async { hub.connection_count().await == 2 }).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(connector.is_connected());

    stale.close(None).await.unwrap();
    wait_until("connector to hold the name", || async {
        hub.connection_count().await == 1 && hub.agent_names().await == vec!["Upper".to_string()]
    })
    .await;

    let client = SuiteClient::connect("tester", settings(&url)).await.unwrap();
    let answer = client.query_timeout("Upper", "hi", Duration::from_secs(5)).await.unwrap();
    assert_eq!(answer, "HI");

    client.shutdown().await;
    connector.shutdown().await;
}
