//! Provider adapters
//!
//! One adapter per external inference provider. Each adapter owns its
//! request/response marshalling, isolating provider-specific quirks behind
//! the uniform [`ProviderAdapter`] contract. Adapters are stateless, shared
//! between requests, and never retry internally: retry and fallback belong
//! exclusively to the orchestrator.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod openrouter;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::RouterConfig;
use crate::core::types::errors::RouterError;
use crate::core::types::{Message, MessageRole, ProviderKind, RouteRequest, TaskCategory};

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;
pub use openrouter::OpenRouterAdapter;

/// Instruction appended to the system content for providers without a
/// native JSON response flag.
pub(crate) const JSON_SYSTEM_INSTRUCTION: &str =
    "Respond with a single valid JSON value and no surrounding prose.";

/// Raw successful reply from one provider, before normalization.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    /// Model that actually served the request, as reported by the provider.
    pub model: String,
    pub text: String,
    /// Usage metadata passed through untouched.
    pub usage: Value,
}

/// Uniform contract over the four providers.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Model used when this provider is called as a Phase-2 fallback.
    fn default_model(&self, task: TaskCategory) -> &'static str;

    /// Perform a single call attempt. No internal retries.
    async fn call(
        &self,
        request: &RouteRequest,
        model: &str,
        api_key: &str,
    ) -> Result<ProviderReply, RouterError>;
}

/// Build the HTTP client shared by the adapters, with finite timeouts on
/// every attempt.
pub(crate) fn build_http_client(config: &RouterConfig) -> Result<reqwest::Client, RouterError> {
    reqwest::ClientBuilder::new()
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .build()
        .map_err(|e| RouterError::configuration(format!("failed to build HTTP client: {e}")))
}

/// Split system content out of a conversation and merge everything else
/// into one user turn, for providers that take the system text in a
/// dedicated field and a single user message.
pub(crate) fn split_system(messages: &[Message]) -> (Option<String>, String) {
    let mut system_parts = Vec::new();
    let mut merged_parts = Vec::new();

    for message in messages {
        match message.role {
            MessageRole::System => system_parts.push(message.content.as_str()),
            _ => merged_parts.push(message.content.as_str()),
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n"))
    };

    (system, merged_parts.join("\n\n"))
}

/// Map a transport-level failure. Timeouts carry no HTTP status, which the
/// orchestrator classifies as retryable.
pub(crate) fn network_error(kind: ProviderKind, err: reqwest::Error) -> RouterError {
    if err.is_timeout() {
        RouterError::network(kind, "request timed out")
    } else {
        RouterError::network(kind, err.to_string())
    }
}

/// Convert a non-success HTTP response into the canonical parseable error.
pub(crate) async fn error_for_status(kind: ProviderKind, response: reqwest::Response) -> RouterError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read error response".to_string());
    RouterError::api(kind, status, body)
}
