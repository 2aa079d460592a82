//! Single-agent HTTP endpoint: `POST /{agent_name}` with `{"query": ...}`.

use crate::connector::Responder;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryResponse {
    Success { result: String },
    Error { message: String },
}

pub fn agent_router(responder: Arc<dyn Responder>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/{agent_name}", post(query_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(responder)
}

pub async fn serve_agent(listener: TcpListener, responder: Arc<dyn Responder>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(agent = %responder.name(), addr = %addr, "Serving agent over HTTP");
    }
    axum::serve(listener, agent_router(responder)).await
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query_handler(
    State(responder): State<Arc<dyn Responder>>,
    Path(agent_name): Path<String>,
    Json(request): Json<QueryRequest>,
) -> (StatusCode, Json<QueryResponse>) {
    if agent_name != responder.name() {
        warn!(requested = %agent_name, agent = %responder.name(), "Query for a different agent");
        return (
            StatusCode::NOT_FOUND,
            Json(QueryResponse::Error {
                message: format!("No agent named '{agent_name}' here"),
            }),
        );
    }

    match responder.respond(&request.query).await {
        Ok(result) => (StatusCode::OK, Json(QueryResponse::Success { result })),
        Err(e) => {
            error!(agent = %agent_name, error = %e, "Query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(QueryResponse::Error { message: e.to_string() }),
            )
        }
    }
}
