//! Request-id correlation for in-flight queries.

use crate::error::SuiteError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, oneshot};
use tracing::debug;

pub type Reply = Result<String, SuiteError>;

/// Waiting callers keyed by request id. Each entry is resolved at most once.
#[derive(Clone, Default)]
pub struct PendingRequests {
    inner: Arc<RwLock<HashMap<String, oneshot::Sender<Reply>>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, request_id: impl Into<String>) -> oneshot::Receiver<Reply> {
        let (tx, rx) = oneshot::channel();
        self.inner.write().await.insert(request_id.into(), tx);
        rx
    }

    /// Deliver a reply. Returns false when the id is unknown or was already
    /// resolved.
    pub async fn resolve(&self, request_id: &str, reply: Reply) -> bool {
        let Some(sender) = self.inner.write().await.remove(request_id) else {
            debug!(request_id = %request_id, "No pending request for reply");
            return false;
        };
        // The caller may have stopped waiting.
        sender.send(reply).is_ok()
    }

    /// Drop an entry without resolving it.
    pub async fn remove(&self, request_id: &str) -> bool {
        self.inner.write().await.remove(request_id).is_some()
    }

    pub async fn contains(&self, request_id: &str) -> bool {
        self.inner.read().await.contains_key(request_id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_resolution_is_a_no_op() {
        let pending = PendingRequests::new();
        let rx = pending.register("r1").await;

        assert!(pending.resolve("r1", Ok("first".into())).await);
        assert!(!pending.resolve("r1", Ok("second".into())).await);
        assert_eq!(rx.await.unwrap().unwrap(), "first");
        assert!(pending.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_id_is_ignored() {
        let pending = PendingRequests::new();
        assert!(!pending.resolve("ghost", Ok(String::new())).await);
    }

    #[tokio::test]
    async fn errors_reach_the_caller() {
        let pending = PendingRequests::new();
        let rx = pending.register("r2").await;
        pending.resolve("r2", Err(SuiteError::Routing("no such agent".into()))).await;
        assert!(matches!(rx.await.unwrap(), Err(SuiteError::Routing(_))));
    }

    #[tokio::test]
    async fn remove_drops_entry_once() {
        let pending = PendingRequests::new();
        let _rx = pending.register("r3").await;
        assert!(pending.contains("r3").await);
        assert!(pending.remove("r3").await);
        assert!(!pending.remove("r3").await);
    }
}
