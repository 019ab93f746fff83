//! Gemini direct adapter
//!
//! Last Phase-2 fallback. System text goes in `systemInstruction` and the
//! rest of the conversation is merged into one user turn under `contents`.
//! Structured output uses the native `responseMimeType` flag.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value, json};

use crate::config::RouterConfig;
use crate::core::types::errors::RouterError;
use crate::core::types::{ProviderKind, RouteRequest, TaskCategory};

use super::{ProviderAdapter, ProviderReply, error_for_status, network_error, split_system};

pub struct GeminiAdapter {
    client: Client,
    base_url: String,
}

impl GeminiAdapter {
    pub fn new(config: &RouterConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request_body(&self, request: &RouteRequest) -> Value {
        let (system, merged) = split_system(&request.messages);

        let mut body = json!({
            "contents": [{"role": "user", "parts": [{"text": merged}]}],
        });

        if let Some(system) = system {
            body["systemInstruction"] = json!({"parts": [{"text": system}]});
        }

        let mut generation_config = Map::new();
        if let Some(temperature) = request.temperature {
            generation_config.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = request.max_output_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        if request.want_json {
            generation_config.insert("responseMimeType".to_string(), json!("application/json"));
        }
        if !generation_config.is_empty() {
            body["generationConfig"] = Value::Object(generation_config);
        }

        body
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn default_model(&self, task: TaskCategory) -> &'static str {
        match task {
            TaskCategory::Analysis | TaskCategory::Strategy => "gemini-1.5-pro",
            _ => "gemini-1.5-flash",
        }
    }

    async fn call(
        &self,
        request: &RouteRequest,
        model: &str,
        api_key: &str,
    ) -> Result<ProviderReply, RouterError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let body = self.request_body(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
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

        let parts = payload["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| RouterError::envelope(self.kind(), "missing candidate parts"))?;

        let mut text = String::new();
        for part in parts {
            if let Some(fragment) = part.get("text").and_then(Value::as_str) {
                text.push_str(fragment);
            }
        }
        if text.is_empty() {
            return Err(RouterError::envelope(self.kind(), "no text parts in candidate"));
        }

        let served_model = payload
            .get("modelVersion")
            .and_then(Value::as_str)
            .unwrap_or(model)
            .to_string();

        let usage = payload.get("usageMetadata").cloned().unwrap_or(Value::Null);

        Ok(ProviderReply {
            model: served_model,
            text,
            usage,
        })
    }
}
