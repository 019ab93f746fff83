//! OpenRouter gateway adapter
//!
//! The primary provider: one account addressing many underlying models,
//! including the `openrouter/auto` routing sentinel. Speaks the
//! OpenAI-compatible chat completions shape with optional attribution
//! headers.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::RouterConfig;
use crate::core::policy::AUTO_ROUTING_MODEL;
use crate::core::types::errors::RouterError;
use crate::core::types::{ProviderKind, RouteRequest, TaskCategory};

use super::{ProviderAdapter, ProviderReply, error_for_status, network_error};

pub struct OpenRouterAdapter {
    client: Client,
    base_url: String,
    site_url: Option<String>,
    site_name: Option<String>,
}

impl OpenRouterAdapter {
    pub fn new(config: &RouterConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.openrouter_base_url.trim_end_matches('/').to_string(),
            site_url: config.site_url.clone(),
            site_name: config.site_name.clone(),
        }
    }

    fn request_body(&self, request: &RouteRequest, model: &str) -> Value {
        let mut body = json!({
            "model": model,
            "messages": request.messages,
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_output_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if request.want_json {
            body["response_format"] = json!({"type": "json_object"});
        }

        body
    }
}

#[async_trait]
impl ProviderAdapter for OpenRouterAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    fn default_model(&self, _task: TaskCategory) -> &'static str {
        AUTO_ROUTING_MODEL
    }

    async fn call(
        &self,
        request: &RouteRequest,
        model: &str,
        api_key: &str,
    ) -> Result<ProviderReply, RouterError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(request, model);

        let mut http_request = self.client.post(&url).bearer_auth(api_key).json(&body);
        if let Some(site_url) = &self.site_url {
            http_request = http_request.header("HTTP-Referer", site_url);
        }
        if let Some(site_name) = &self.site_name {
            http_request = http_request.header("X-Title", site_name);
        }

        let response = http_request
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

        let text = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| RouterError::envelope(self.kind(), "missing message content"))?
            .to_string();

        // The gateway reports which underlying model actually served the
        // request; prefer it over the requested alias.
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
