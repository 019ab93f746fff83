//! Best-effort attempt auditing
//!
//! One row per provider call attempt, success or failure, written to the
//! record store from a detached task. Audit writes are a non-critical side
//! channel: failures are logged at debug level and swallowed, and the
//! request path never waits on them.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::core::types::{ProviderKind, RouteRequest};
use crate::storage::RecordStore;

/// Action name stamped on every audit row.
const AUDIT_ACTION: &str = "llm.completion";

/// Outcome of a single provider call attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub provider: ProviderKind,
    /// Model used for the attempt. `None` on direct-provider failures where
    /// no model was resolved.
    pub model: Option<String>,
    pub success: bool,
    pub duration: Duration,
    pub error: Option<String>,
    /// Full candidate list, recorded on gateway attempts only.
    pub candidates: Option<Vec<String>>,
}

pub struct AuditLogger {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Record one attempt. Fire-and-forget: spawns the write and returns
    /// immediately.
    pub fn record(&self, request: &RouteRequest, correlation_id: &str, attempt: Attempt) {
        let row = json!({
            "actor_id": request.actor_id,
            "action": AUDIT_ACTION,
            "entity_type": request.entity_type,
            "entity_id": request.entity_id,
            "created_at": chrono::Utc::now().to_rfc3339(),
            "payload": {
                "provider": attempt.provider.as_str(),
                "model": attempt.model,
                "success": attempt.success,
                "duration_ms": attempt.duration.as_millis() as u64,
                "task": request.task.as_str(),
                "correlation_id": correlation_id,
                "want_json": request.want_json,
                "error": attempt.error,
                "candidates": attempt.candidates,
            }
        });

        let store = Arc::clone(&self.store);
        let table = self.table.clone();
        tokio::spawn(async move {
            if let Err(err) = store.insert_record(&table, row).await {
                debug!(error = %err, "audit write failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{TaskCategory, user_message};
    use crate::storage::MemoryRecordStore;

    fn request() -> RouteRequest {
        RouteRequest::new(vec![user_message("hi")])
            .with_task(TaskCategory::Sales)
            .with_actor("user-7")
            .for_entity("deal", "d-1")
    }

    async fn wait_for_rows(store: &MemoryRecordStore, table: &str) -> Vec<serde_json::Value> {
        for _ in 0..50 {
            let rows = store.inserted_rows(table);
            if !rows.is_empty() {
                return rows;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Vec::new()
    }

    #[tokio::test]
    async fn test_success_row_shape() {
        let store = Arc::new(MemoryRecordStore::new());
        let logger = AuditLogger::new(Arc::clone(&store) as Arc<dyn RecordStore>, "ai_audit_log");

        logger.record(
            &request(),
            "corr-1",
            Attempt {
                provider: ProviderKind::OpenRouter,
                model: Some("modelX".to_string()),
                success: true,
                duration: Duration::from_millis(120),
                error: None,
                candidates: Some(vec!["modelX".to_string(), "openrouter/auto".to_string()]),
            },
        );

        let rows = wait_for_rows(&store, "ai_audit_log").await;
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["action"], AUDIT_ACTION);
        assert_eq!(row["actor_id"], "user-7");
        assert_eq!(row["entity_type"], "deal");
        assert_eq!(row["payload"]["provider"], "openrouter");
        assert_eq!(row["payload"]["success"], true);
        assert_eq!(row["payload"]["task"], "sales");
        assert_eq!(row["payload"]["correlation_id"], "corr-1");
        assert_eq!(row["payload"]["candidates"][1], "openrouter/auto");
    }

    #[tokio::test]
    async fn test_failure_row_without_model() {
        let store = Arc::new(MemoryRecordStore::new());
        let logger = AuditLogger::new(Arc::clone(&store) as Arc<dyn RecordStore>, "ai_audit_log");

        logger.record(
            &request(),
            "corr-2",
            Attempt {
                provider: ProviderKind::Anthropic,
                model: None,
                success: false,
                duration: Duration::from_millis(30),
                error: Some("Anthropic error (500): boom".to_string()),
                candidates: None,
            },
        );

        let rows = wait_for_rows(&store, "ai_audit_log").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["payload"]["model"], serde_json::Value::Null);
        assert_eq!(rows[0]["payload"]["success"], false);
        assert_eq!(
            rows[0]["payload"]["error"],
            "Anthropic error (500): boom"
        );
    }
}
