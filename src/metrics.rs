//! Execution metrics tracking
//!
//! Records per-step timing and completion for display and diagnostics.
//! Never consulted for correctness decisions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Timing record for one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionMetric {
    pub execution_time_ms: u64,
    pub is_complete: bool,
}

/// Shared store of step metrics, keyed by `{request_id}:{role}`
#[derive(Clone, Default)]
pub struct MetricsStore {
    inner: Arc<RwLock<HashMap<String, ExecutionMetric>>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, key: impl Into<String>, execution_time_ms: u64, is_complete: bool) {
        let mut inner = self.inner.write().await;
        inner.insert(
            key.into(),
            ExecutionMetric {
                execution_time_ms,
                is_complete,
            },
        );
    }

    pub async fn snapshot(&self) -> HashMap<String, ExecutionMetric> {
        self.inner.read().await.clone()
    }

    pub async fn get(&self, key: &str) -> Option<ExecutionMetric> {
        self.inner.read().await.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_snapshot() {
        let store = MetricsStore::new();
        store.record("req-1:security", 42, true).await;
        store.record("req-1:quality", 7, false).await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["req-1:security"].execution_time_ms, 42);
        assert!(snapshot["req-1:security"].is_complete);
        assert!(!snapshot["req-1:quality"].is_complete);
    }

    #[tokio::test]
    async fn test_record_overwrites() {
        let store = MetricsStore::new();
        store.record("k", 1, false).await;
        store.record("k", 5, true).await;
        let metric = store.get("k").await.unwrap();
        assert_eq!(metric.execution_time_ms, 5);
        assert!(metric.is_complete);
    }
}
