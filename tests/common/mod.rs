//! Shared test infrastructure
//!
//! Spins up one wiremock server per provider, wires a `RouterConfig` at
//! them, and exposes the in-memory record store so tests can seed provider
//! settings and assert on the audit trail.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use wiremock::MockServer;

use ai_router::{MemoryRecordStore, RecordStore, Router, RouterConfig};

pub const AUDIT_TABLE: &str = "ai_audit_log";
pub const SETTINGS_TABLE: &str = "provider_settings";

pub struct TestHarness {
    pub gateway: MockServer,
    pub openai: MockServer,
    pub anthropic: MockServer,
    pub gemini: MockServer,
    pub store: Arc<MemoryRecordStore>,
}

impl TestHarness {
    pub async fn start() -> Self {
        Self {
            gateway: MockServer::start().await,
            openai: MockServer::start().await,
            anthropic: MockServer::start().await,
            gemini: MockServer::start().await,
            store: Arc::new(MemoryRecordStore::new()),
        }
    }

    /// Config with every provider pointed at its mock and an env-style
    /// API key for each.
    pub fn config(&self) -> RouterConfig {
        RouterConfig {
            openrouter_api_key: Some("env-openrouter-key".to_string()),
            openai_api_key: Some("env-openai-key".to_string()),
            anthropic_api_key: Some("env-anthropic-key".to_string()),
            gemini_api_key: Some("env-gemini-key".to_string()),
            openrouter_base_url: self.gateway.uri(),
            openai_base_url: self.openai.uri(),
            anthropic_base_url: self.anthropic.uri(),
            gemini_base_url: self.gemini.uri(),
            request_timeout: 5,
            connect_timeout: 2,
            ..Default::default()
        }
    }

    pub fn router(&self, config: RouterConfig) -> Router {
        Router::new(config, Arc::clone(&self.store) as Arc<dyn RecordStore>)
            .expect("router construction")
    }

    /// Seed the gateway's remote settings record.
    pub fn seed_gateway_record(&self, record: Value) {
        self.store.put_record(SETTINGS_TABLE, "openrouter", record);
    }

    /// Audit writes are fire-and-forget; poll until at least `min` rows
    /// have landed.
    pub async fn wait_audit_rows(&self, min: usize) -> Vec<Value> {
        for _ in 0..100 {
            let rows = self.store.inserted_rows(AUDIT_TABLE);
            if rows.len() >= min {
                return rows;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.store.inserted_rows(AUDIT_TABLE)
    }
}

/// OpenAI-compatible completion envelope, as served by the gateway and the
/// OpenAI direct endpoint.
pub fn chat_completion_body(model: &str, content: &str) -> Value {
    json!({
        "id": "cmpl-test",
        "object": "chat.completion",
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
    })
}

pub fn anthropic_completion_body(model: &str, text: &str) -> Value {
    json!({
        "id": "msg-test",
        "type": "message",
        "model": model,
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 12, "output_tokens": 7}
    })
}

pub fn gemini_completion_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 7}
    })
}
