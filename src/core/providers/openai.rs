//! OpenAI direct adapter
//!
//! First Phase-2 fallback. Takes system/user/assistant messages natively,
//! so the conversation passes through unchanged.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::RouterConfig;
use crate::core::types::errors::RouterError;
use crate::core::types::{ProviderKind, RouteRequest, TaskCategory};

use super::{ProviderAdapter, ProviderReply, error_for_status, network_error};

pub struct OpenAiAdapter {
    client: Client,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new(config: &RouterConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
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
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn default_model(&self, task: TaskCategory) -> &'static str {
        match task {
            TaskCategory::Analysis | TaskCategory::Strategy => "gpt-4o",
            _ => "gpt-4o-mini",
        }
    }

    async fn call(
        &self,
        request: &RouteRequest,
        model: &str,
        api_key: &str,
    ) -> Result<ProviderReply, RouterError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(request, model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
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

        let text = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| RouterError::envelope(self.kind(), "missing message content"))?
            .to_string();

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::user_message;

    fn adapter() -> OpenAiAdapter {
        OpenAiAdapter::new(&RouterConfig::default(), Client::new())
    }

    #[test]
    fn test_default_model_by_task() {
        let adapter = adapter();
        assert_eq!(adapter.default_model(TaskCategory::Analysis), "gpt-4o");
        assert_eq!(adapter.default_model(TaskCategory::Strategy), "gpt-4o");
        assert_eq!(adapter.default_model(TaskCategory::General), "gpt-4o-mini");
        assert_eq!(adapter.default_model(TaskCategory::Chat), "gpt-4o-mini");
    }

    #[test]
    fn test_request_body_json_mode() {
        let request = RouteRequest::new(vec![user_message("q")]).expect_json();
        let body = adapter().request_body(&request, "gpt-4o-mini");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "user");
    }
}
