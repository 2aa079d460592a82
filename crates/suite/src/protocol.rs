//! Wire messages exchanged between the Suite, clients, and agents.
//!
//! Every frame is a JSON object with a snake_case `type` discriminator.

use crate::error::SuiteError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuiteMessage {
    /// Agent announces itself.
    Join { name: String },

    ClientJoin { client_name: String },

    ClientQuery {
        agent_name: String,
        query: String,
        request_id: String,
    },

    /// A client query forwarded to the target agent.
    AgentQuery { query: String, request_id: String },

    AgentQueryResponse { request_id: String, result: String },

    ClientQueryResponse { request_id: String, result: String },

    System { message: String, timestamp: String },

    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// Sent empty as a request; the Suite answers with every field set.
    Status {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        clients: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agents: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uptime_secs: Option<u64>,
    },
}

impl SuiteMessage {
    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: impl Into<String>, request_id: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            request_id,
        }
    }

    pub fn status_request() -> Self {
        Self::Status {
            clients: None,
            agents: None,
            uptime_secs: None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::ClientJoin { .. } => "client_join",
            Self::ClientQuery { .. } => "client_query",
            Self::AgentQuery { .. } => "agent_query",
            Self::AgentQueryResponse { .. } => "agent_query_response",
            Self::ClientQueryResponse { .. } => "client_query_response",
            Self::System { .. } => "system",
            Self::Error { .. } => "error",
            Self::Status { .. } => "status",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn parse(text: &str) -> Result<Self, SuiteError> {
        serde_json::from_str(text).map_err(|e| SuiteError::Protocol(format!("invalid message: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_query_wire_format() {
        let msg = SuiteMessage::ClientQuery {
            agent_name: "WebAgent".into(),
            query: "news?".into(),
            request_id: "r1".into(),
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(
            value,
            json!({"type": "client_query", "agent_name": "WebAgent", "query": "news?", "request_id": "r1"})
        );
    }

    #[test]
    fn error_without_request_id_omits_field() {
        let text = SuiteMessage::error("nope", None).to_json();
        assert_eq!(text, r#"{"type":"error","message":"nope"}"#);
        assert_eq!(SuiteMessage::parse(&text).unwrap(), SuiteMessage::error("nope", None));
    }

    #[test]
    fn empty_status_is_a_request() {
        let msg = SuiteMessage::parse(r#"{"type":"status"}"#).unwrap();
        assert_eq!(msg, SuiteMessage::status_request());
    }

    #[test]
    fn unknown_type_is_protocol_error() {
        let err = SuiteMessage::parse(r#"{"type":"dance"}"#).unwrap_err();
        assert!(matches!(err, SuiteError::Protocol(_)));
        assert!(SuiteMessage::parse("not json").is_err());
    }

    #[test]
    fn system_carries_timestamp() {
        match SuiteMessage::system("hello") {
            SuiteMessage::System { message, timestamp } => {
                assert_eq!(message, "hello");
                assert!(chrono::DateTime::parse_from_rfc3339(&timestamp).is_ok());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
