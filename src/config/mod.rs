//! Router configuration
//!
//! `RouterConfig` snapshots the environment once at construction. Every
//! credential has an env fallback consulted when the record-store lookup is
//! absent or empty, and two policy overrides (a single fixed model and a
//! JSON-encoded policy map) can be supplied via the environment.

use std::env;

use crate::core::types::ProviderKind;

/// Default TTL for the cached gateway settings lookup, in seconds.
pub const DEFAULT_SETTINGS_CACHE_TTL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Env-sourced credential fallbacks, one per provider.
    pub openrouter_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,

    /// Process-wide fixed-model override. When set, candidate resolution
    /// returns exactly this model and consults nothing else.
    pub fixed_model: Option<String>,
    /// JSON-encoded policy map (task -> ordered model list), consulted after
    /// the remote policy sources.
    pub model_policy_json: Option<String>,

    pub openrouter_base_url: String,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,

    /// Optional attribution headers forwarded to the gateway.
    pub site_url: Option<String>,
    pub site_name: Option<String>,

    /// Record store endpoint and key; when absent the router runs with an
    /// in-memory store (env-only config, in-process audit trail).
    pub store_base_url: Option<String>,
    pub store_api_key: Option<String>,
    pub settings_table: String,
    pub audit_table: String,

    /// Per-attempt HTTP timeouts, seconds.
    pub request_timeout: u64,
    pub connect_timeout: u64,
    pub settings_cache_ttl: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            openai_api_key: None,
            anthropic_api_key: None,
            gemini_api_key: None,
            fixed_model: None,
            model_policy_json: None,
            openrouter_base_url: "https://openrouter.ai/api/v1".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            site_url: None,
            site_name: None,
            store_base_url: None,
            store_api_key: None,
            settings_table: "provider_settings".to_string(),
            audit_table: "ai_audit_log".to_string(),
            request_timeout: 60,
            connect_timeout: 10,
            settings_cache_ttl: DEFAULT_SETTINGS_CACHE_TTL_SECS,
        }
    }
}

impl RouterConfig {
    /// Snapshot configuration from the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        config.openrouter_api_key = non_empty_env("OPENROUTER_API_KEY");
        config.openai_api_key = non_empty_env("OPENAI_API_KEY");
        config.anthropic_api_key = non_empty_env("ANTHROPIC_API_KEY");
        config.gemini_api_key = non_empty_env("GEMINI_API_KEY");

        config.fixed_model = non_empty_env("AI_ROUTER_FIXED_MODEL");
        config.model_policy_json = non_empty_env("AI_ROUTER_MODEL_POLICY");

        if let Some(url) = non_empty_env("OPENROUTER_BASE_URL") {
            config.openrouter_base_url = url;
        }
        if let Some(url) = non_empty_env("OPENAI_BASE_URL") {
            config.openai_base_url = url;
        }
        if let Some(url) = non_empty_env("ANTHROPIC_BASE_URL") {
            config.anthropic_base_url = url;
        }
        if let Some(url) = non_empty_env("GEMINI_BASE_URL") {
            config.gemini_base_url = url;
        }

        config.site_url = non_empty_env("AI_ROUTER_SITE_URL");
        config.site_name = non_empty_env("AI_ROUTER_SITE_NAME");

        config.store_base_url = non_empty_env("AI_ROUTER_STORE_URL");
        config.store_api_key = non_empty_env("AI_ROUTER_STORE_KEY");
        if let Some(table) = non_empty_env("AI_ROUTER_SETTINGS_TABLE") {
            config.settings_table = table;
        }
        if let Some(table) = non_empty_env("AI_ROUTER_AUDIT_TABLE") {
            config.audit_table = table;
        }

        if let Ok(timeout) = env::var("AI_ROUTER_TIMEOUT") {
            config.request_timeout = timeout.parse().unwrap_or(config.request_timeout);
        }
        if let Ok(timeout) = env::var("AI_ROUTER_CONNECT_TIMEOUT") {
            config.connect_timeout = timeout.parse().unwrap_or(config.connect_timeout);
        }
        if let Ok(ttl) = env::var("AI_ROUTER_SETTINGS_CACHE_TTL") {
            config.settings_cache_ttl = ttl.parse().unwrap_or(config.settings_cache_ttl);
        }

        config
    }

    /// Env credential fallback for a provider, consulted after the store.
    pub fn api_key_fallback(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::OpenRouter => self.openrouter_api_key.as_deref(),
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    pub fn with_fixed_model(mut self, model: impl Into<String>) -> Self {
        self.fixed_model = Some(model.into());
        self
    }

    pub fn with_model_policy_json(mut self, policy_json: impl Into<String>) -> Self {
        self.model_policy_json = Some(policy_json.into());
        self
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
