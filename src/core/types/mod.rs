//! Core type definitions for the router
//!
//! Contains the request/response contract shared by all provider adapters.

pub mod errors;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Role of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single conversation turn. Order within a request is significant and is
/// preserved across every provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Create a system message
pub fn system_message(content: impl Into<String>) -> Message {
    Message::new(MessageRole::System, content)
}

/// Create a user message
pub fn user_message(content: impl Into<String>) -> Message {
    Message::new(MessageRole::User, content)
}

/// Create an assistant message
pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::new(MessageRole::Assistant, content)
}

/// Task category attached to a request. Used only to bias model selection;
/// unknown labels fall back to `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskCategory {
    #[default]
    General,
    Analysis,
    Strategy,
    Sales,
    Copywriting,
    Hr,
    Sentiment,
    Classification,
    Chat,
    DashboardSummary,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 10] = [
        TaskCategory::General,
        TaskCategory::Analysis,
        TaskCategory::Strategy,
        TaskCategory::Sales,
        TaskCategory::Copywriting,
        TaskCategory::Hr,
        TaskCategory::Sentiment,
        TaskCategory::Classification,
        TaskCategory::Chat,
        TaskCategory::DashboardSummary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskCategory::General => "general",
            TaskCategory::Analysis => "analysis",
            TaskCategory::Strategy => "strategy",
            TaskCategory::Sales => "sales",
            TaskCategory::Copywriting => "copywriting",
            TaskCategory::Hr => "hr",
            TaskCategory::Sentiment => "sentiment",
            TaskCategory::Classification => "classification",
            TaskCategory::Chat => "chat",
            TaskCategory::DashboardSummary => "dashboard_summary",
        }
    }

    /// Parse a category label, falling back to `General` for anything
    /// unrecognized.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "analysis" => TaskCategory::Analysis,
            "strategy" => TaskCategory::Strategy,
            "sales" => TaskCategory::Sales,
            "copywriting" => TaskCategory::Copywriting,
            "hr" => TaskCategory::Hr,
            "sentiment" => TaskCategory::Sentiment,
            "classification" => TaskCategory::Classification,
            "chat" => TaskCategory::Chat,
            "dashboard_summary" => TaskCategory::DashboardSummary,
            _ => TaskCategory::General,
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TaskCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(TaskCategory::from_key(&key))
    }
}

/// Identity of an inference provider.
///
/// `OpenRouter` is the gateway tried first across its candidate model list;
/// the remaining three are direct fallbacks tried in `DIRECT_ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenRouter,
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    /// Fixed fallback order for the direct providers.
    pub const DIRECT_ORDER: [ProviderKind; 3] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
    ];

    /// Lowercase identifier used for store records and audit rows.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Human-facing name, used in error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "OpenRouter",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A routed completion request.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    /// Ordered conversation. Must be non-empty.
    pub messages: Vec<Message>,
    pub task: TaskCategory,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// When set, the response must carry `parsed_json` or the call fails.
    pub want_json: bool,
    /// Generated when absent; threaded through every audit row.
    pub correlation_id: Option<String>,
    pub actor_id: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
}

impl RouteRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            task: TaskCategory::General,
            temperature: None,
            max_output_tokens: None,
            want_json: false,
            correlation_id: None,
            actor_id: None,
            entity_type: None,
            entity_id: None,
        }
    }

    pub fn with_task(mut self, task: TaskCategory) -> Self {
        self.task = task;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn expect_json(mut self) -> Self {
        self.want_json = true;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn for_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }
}

/// Normalized completion response, identical across providers.
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub provider: ProviderKind,
    /// Model that actually served the request; may differ from the requested
    /// alias when the gateway routes automatically.
    pub model: String,
    pub text: String,
    /// Present when the request asked for structured output.
    pub parsed_json: Option<Value>,
    /// Provider usage metadata, passed through untouched.
    pub usage: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_category_round_trip() {
        for task in TaskCategory::ALL {
            assert_eq!(TaskCategory::from_key(task.as_str()), task);
        }
    }

    #[test]
    fn test_unknown_task_falls_back_to_general() {
        assert_eq!(TaskCategory::from_key("poetry"), TaskCategory::General);
        assert_eq!(TaskCategory::from_key(""), TaskCategory::General);
        assert_eq!(TaskCategory::from_key("  Analysis "), TaskCategory::Analysis);
    }

    #[test]
    fn test_provider_kind_identifiers() {
        assert_eq!(ProviderKind::OpenRouter.as_str(), "openrouter");
        assert_eq!(ProviderKind::OpenAi.to_string(), "OpenAI");
        assert_eq!(
            ProviderKind::DIRECT_ORDER,
            [
                ProviderKind::OpenAi,
                ProviderKind::Anthropic,
                ProviderKind::Gemini
            ]
        );
    }

    #[test]
    fn test_request_builder() {
        let request = RouteRequest::new(vec![user_message("hi")])
            .with_task(TaskCategory::Analysis)
            .with_temperature(0.2)
            .expect_json()
            .with_actor("user-1")
            .for_entity("report", "42");

        assert_eq!(request.task, TaskCategory::Analysis);
        assert_eq!(request.temperature, Some(0.2));
        assert!(request.want_json);
        assert_eq!(request.entity_type.as_deref(), Some("report"));
    }

    #[test]
    fn test_task_category_serde() {
        let task: TaskCategory = serde_json::from_str("\"sentiment\"").unwrap();
        assert_eq!(task, TaskCategory::Sentiment);
        assert_eq!(serde_json::to_string(&task).unwrap(), "\"sentiment\"");

        let unknown: TaskCategory = serde_json::from_str("\"no-such-task\"").unwrap();
        assert_eq!(unknown, TaskCategory::General);
    }
}
