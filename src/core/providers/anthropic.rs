//! Anthropic direct adapter
//!
//! Second Phase-2 fallback. The messages API takes system text in a
//! dedicated top-level field, so the conversation is merged into a single
//! user turn. There is no native JSON response flag; structured-output
//! requests append an instruction to the system content instead.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::RouterConfig;
use crate::core::types::errors::RouterError;
use crate::core::types::{ProviderKind, RouteRequest, TaskCategory};

use super::{
    JSON_SYSTEM_INSTRUCTION, ProviderAdapter, ProviderReply, error_for_status, network_error,
    split_system,
};

const API_VERSION: &str = "2023-06-01";

/// The messages API requires max_tokens on every request.
const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct AnthropicAdapter {
    client: Client,
    base_url: String,
}

impl AnthropicAdapter {
    pub fn new(config: &RouterConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.anthropic_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request_body(&self, request: &RouteRequest, model: &str) -> Value {
        let (mut system, merged) = split_system(&request.messages);

        if request.want_json {
            system = Some(match system {
                Some(text) => format!("{text}\n{JSON_SYSTEM_INSTRUCTION}"),
                None => JSON_SYSTEM_INSTRUCTION.to_string(),
            });
        }

        let mut body = json!({
            "model": model,
            "max_tokens": request.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": [{"role": "user", "content": merged}],
        });

        if let Some(system) = system {
            body["system"] = json!(system);
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        body
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn default_model(&self, task: TaskCategory) -> &'static str {
        match task {
            TaskCategory::Analysis | TaskCategory::Strategy | TaskCategory::Copywriting => {
                "claude-3-5-sonnet-20241022"
            }
            _ => "claude-3-5-haiku-20241022",
        }
    }

    async fn call(
        &self,
        request: &RouteRequest,
        model: &str,
        api_key: &str,
    ) -> Result<ProviderReply, RouterError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.request_body(request, model);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(self.kind(), e))?;

        if !response.status().is_success() {
            return Err(error_for_status(self.kind(), response).await);
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| RouterError::envelope(self.kind(), e.to_string()))?;

        let content = payload
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| RouterError::envelope(self.kind(), "missing content array"))?;

        let mut text = String::new();
        for block in content {
            if block.get("type").and_then(Value::as_str) == Some("text") {
                if let Some(part) = block.get("text").and_then(Value::as_str) {
                    text.push_str(part);
                }
            }
        }
        if text.is_empty() {
            return Err(RouterError::envelope(self.kind(), "no text blocks in content"));
        }

        let served_model = payload
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(model)
            .to_string();

        let usage = payload.get("usage").cloned().unwrap_or(Value::Null);

        Ok(ProviderReply {
            model: served_model,
            text,
            usage,
        })
    }
}
