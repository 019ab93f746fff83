//! Fallback orchestration across providers
//!
//! Drives the overall attempt sequence for one request: the gateway
//! provider across its resolved candidate model list first, then the direct
//! providers in fixed order. Attempts are strictly sequential: providers
//! bill per call, so speculative parallel attempts are off the table.

use std::sync::Arc;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RouterConfig;
use crate::core::audit::{Attempt, AuditLogger};
use crate::core::normalize::extract_json;
use crate::core::policy::{SettingsStore, resolve_candidate_models};
use crate::core::providers::{
    AnthropicAdapter, GeminiAdapter, OpenAiAdapter, OpenRouterAdapter, ProviderAdapter,
    ProviderReply, build_http_client,
};
use crate::core::types::errors::RouterError;
use crate::core::types::{ProviderKind, RouteRequest, RouteResponse};
use crate::storage::{MemoryRecordStore, RecordStore, RestRecordStore};

/// Pulls the HTTP status back out of a canonical provider error message,
/// e.g. `"OpenRouter error (429): ..."`. Network failures carry no status.
fn parse_status_code(message: &str) -> Option<u16> {
    static STATUS_IN_MESSAGE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\((\d{3})\)").expect("static regex"));
    STATUS_IN_MESSAGE
        .captures(message)
        .and_then(|captures| captures.get(1))
        .and_then(|status| status.as_str().parse().ok())
}

/// 400 bodies matching these are treated as "this model alias isn't
/// available here, try the next candidate".
const MODEL_ERROR_KEYWORDS: [&str; 4] = ["model", "not found", "no such", "invalid"];

/// Classify a gateway attempt failure. Applies only within Phase 1, across
/// the gateway's own candidate models.
fn is_retryable_gateway_error(message: &str) -> bool {
    match parse_status_code(message) {
        // Network error or timeout: the next alias may be served elsewhere.
        None => true,
        Some(401) | Some(403) => false,
        Some(408) | Some(429) => true,
        Some(status) if (500..=599).contains(&status) => true,
        Some(400) => {
            let lower = message.to_ascii_lowercase();
            MODEL_ERROR_KEYWORDS
                .iter()
                .any(|keyword| lower.contains(keyword))
        }
        Some(_) => false,
    }
}

/// Multi-provider request router.
///
/// The single entry point the rest of an application depends on is
/// [`Router::complete`]. Adapters are stateless and shared; the only shared
/// mutable state across concurrent calls is the settings cache.
pub struct Router {
    config: RouterConfig,
    settings: SettingsStore,
    audit: AuditLogger,
    gateway: OpenRouterAdapter,
    direct: [Box<dyn ProviderAdapter>; 3],
}

impl Router {
    pub fn new(config: RouterConfig, store: Arc<dyn RecordStore>) -> Result<Self, RouterError> {
        let client = build_http_client(&config)?;

        let gateway = OpenRouterAdapter::new(&config, client.clone());
        let direct: [Box<dyn ProviderAdapter>; 3] = [
            Box::new(OpenAiAdapter::new(&config, client.clone())),
            Box::new(AnthropicAdapter::new(&config, client.clone())),
            Box::new(GeminiAdapter::new(&config, client)),
        ];

        let settings = SettingsStore::new(
            Arc::clone(&store),
            config.settings_table.clone(),
            Duration::from_secs(config.settings_cache_ttl),
        );
        let audit = AuditLogger::new(store, config.audit_table.clone());

        Ok(Self {
            config,
            settings,
            audit,
            gateway,
            direct,
        })
    }

    /// Build a router from the environment. Uses the REST record store when
    /// one is configured, otherwise an in-memory store (env-only config).
    pub fn from_env() -> Result<Self, RouterError> {
        let config = RouterConfig::from_env();

        let store: Arc<dyn RecordStore> = match (&config.store_base_url, &config.store_api_key) {
            (Some(base_url), Some(api_key)) => Arc::new(
                RestRecordStore::new(
                    base_url.as_str(),
                    api_key.as_str(),
                    Duration::from_secs(config.request_timeout),
                    Duration::from_secs(config.connect_timeout),
                )
                .map_err(|e| RouterError::configuration(e.to_string()))?,
            ),
            _ => Arc::new(MemoryRecordStore::new()),
        };

        Self::new(config, store)
    }

    /// Route one completion request, falling back across providers until one
    /// succeeds or everything is exhausted.
    pub async fn complete(&self, request: RouteRequest) -> Result<RouteResponse, RouterError> {
        if request.messages.is_empty() {
            return Err(RouterError::validation("request contains no messages"));
        }

        let correlation_id = request
            .correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        info!(
            task = request.task.as_str(),
            correlation_id = correlation_id.as_str(),
            want_json = request.want_json,
            "routing completion request"
        );

        // Per-provider failure summaries, in attempt order.
        let mut failures: Vec<(ProviderKind, String)> = Vec::new();

        if let Some(response) = self
            .try_gateway(&request, &correlation_id, &mut failures)
            .await?
        {
            return Ok(response);
        }

        warn!(
            correlation_id = correlation_id.as_str(),
            "gateway exhausted, falling back to direct providers"
        );

        if let Some(response) = self
            .try_direct_providers(&request, &correlation_id, &mut failures)
            .await?
        {
            return Ok(response);
        }

        let summary = failures
            .iter()
            .map(|(kind, message)| format!("{}: {}", kind.as_str(), message))
            .collect::<Vec<_>>()
            .join(" | ");
        Err(RouterError::AllProvidersFailed(summary))
    }

    /// Phase 1: the gateway provider across its candidate model list.
    ///
    /// Returns `Ok(Some(..))` on success, `Ok(None)` when Phase 2 should
    /// run, and `Err` only for non-retryable contract errors (structured
    /// output missing from an otherwise successful response).
    async fn try_gateway(
        &self,
        request: &RouteRequest,
        correlation_id: &str,
        failures: &mut Vec<(ProviderKind, String)>,
    ) -> Result<Option<RouteResponse>, RouterError> {
        let kind = ProviderKind::OpenRouter;
        let settings = self.settings.provider_settings(kind).await;

        let candidates = resolve_candidate_models(
            request.task,
            self.config.fixed_model.as_deref(),
            self.config.model_policy_json.as_deref(),
            settings.raw_policy.as_ref(),
        );
        debug!(candidates = ?candidates, "resolved gateway candidate models");

        let api_key = settings
            .api_key
            .or_else(|| self.config.api_key_fallback(kind).map(str::to_string));
        let Some(api_key) = api_key else {
            failures.push((kind, "no API key configured".to_string()));
            return Ok(None);
        };

        let mut attempt_errors: Vec<(String, String)> = Vec::new();
        for model in &candidates {
            let started = Instant::now();
            match self.gateway.call(request, model, &api_key).await {
                Ok(reply) => {
                    self.audit.record(
                        request,
                        correlation_id,
                        Attempt {
                            provider: kind,
                            model: Some(reply.model.clone()),
                            success: true,
                            duration: started.elapsed(),
                            error: None,
                            candidates: Some(candidates.clone()),
                        },
                    );
                    return self.finish(kind, reply, request).map(Some);
                }
                Err(err) => {
                    let message = err.to_string();
                    warn!(
                        model = model.as_str(),
                        error = message.as_str(),
                        "gateway attempt failed"
                    );
                    self.audit.record(
                        request,
                        correlation_id,
                        Attempt {
                            provider: kind,
                            model: Some(model.clone()),
                            success: false,
                            duration: started.elapsed(),
                            error: Some(message.clone()),
                            candidates: Some(candidates.clone()),
                        },
                    );
                    let retryable = is_retryable_gateway_error(&message);
                    attempt_errors.push((model.clone(), message));
                    if !retryable {
                        break;
                    }
                }
            }
        }

        let summary = attempt_errors
            .iter()
            .map(|(model, message)| format!("{model}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        failures.push((kind, summary));
        Ok(None)
    }

    /// Phase 2: the direct providers, in fixed order. Every failure falls
    /// through to the next provider, since each is a structurally different
    /// service and one failing says nothing about the others.
    async fn try_direct_providers(
        &self,
        request: &RouteRequest,
        correlation_id: &str,
        failures: &mut Vec<(ProviderKind, String)>,
    ) -> Result<Option<RouteResponse>, RouterError> {
        for adapter in &self.direct {
            let kind = adapter.kind();
            let settings = self.settings.provider_settings(kind).await;
            let api_key = settings
                .api_key
                .or_else(|| self.config.api_key_fallback(kind).map(str::to_string));
            let Some(api_key) = api_key else {
                failures.push((kind, "no API key configured".to_string()));
                continue;
            };

            let model = adapter.default_model(request.task);
            let started = Instant::now();
            match adapter.call(request, model, &api_key).await {
                Ok(reply) => {
                    self.audit.record(
                        request,
                        correlation_id,
                        Attempt {
                            provider: kind,
                            model: Some(reply.model.clone()),
                            success: true,
                            duration: started.elapsed(),
                            error: None,
                            candidates: None,
                        },
                    );
                    return self.finish(kind, reply, request).map(Some);
                }
                Err(err) => {
                    let message = err.to_string();
                    warn!(
                        provider = kind.as_str(),
                        error = message.as_str(),
                        "direct provider attempt failed"
                    );
                    self.audit.record(
                        request,
                        correlation_id,
                        Attempt {
                            provider: kind,
                            model: None,
                            success: false,
                            duration: started.elapsed(),
                            error: Some(message.clone()),
                            candidates: None,
                        },
                    );
                    failures.push((kind, message));
                }
            }
        }

        Ok(None)
    }

    /// Normalize a successful reply. A structured-output miss is a contract
    /// error surfaced directly, never retried against another provider.
    fn finish(
        &self,
        kind: ProviderKind,
        reply: ProviderReply,
        request: &RouteRequest,
    ) -> Result<RouteResponse, RouterError> {
        let parsed_json = if request.want_json {
            Some(extract_json(&reply.text)?)
        } else {
            None
        };

        info!(
            provider = kind.as_str(),
            model = reply.model.as_str(),
            "completion served"
        );

        Ok(RouteResponse {
            provider: kind,
            model: reply.model,
            text: reply.text,
            parsed_json,
            usage: reply.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_code_from_canonical_message() {
        assert_eq!(
            parse_status_code("OpenRouter error (429): too many requests"),
            Some(429)
        );
        assert_eq!(parse_status_code("Anthropic error (401): nope"), Some(401));
        assert_eq!(parse_status_code("Gemini network error: timed out"), None);
    }

    #[test]
    fn test_auth_failures_are_fatal() {
        assert!(!is_retryable_gateway_error("OpenRouter error (401): denied"));
        assert!(!is_retryable_gateway_error("OpenRouter error (403): denied"));
    }

    #[test]
    fn test_transient_statuses_are_retryable() {
        assert!(is_retryable_gateway_error("OpenRouter error (429): slow down"));
        assert!(is_retryable_gateway_error("OpenRouter error (408): timeout"));
        assert!(is_retryable_gateway_error("OpenRouter error (500): oops"));
        assert!(is_retryable_gateway_error("OpenRouter error (503): down"));
    }

    #[test]
    fn test_no_status_is_retryable() {
        assert!(is_retryable_gateway_error(
            "OpenRouter network error: request timed out"
        ));
    }

    #[test]
    fn test_model_related_400_is_retryable() {
        assert!(is_retryable_gateway_error(
            "OpenRouter error (400): No such model: foo/bar"
        ));
        assert!(is_retryable_gateway_error(
            "OpenRouter error (400): invalid model identifier"
        ));
    }

    #[test]
    fn test_other_400_is_fatal() {
        assert!(!is_retryable_gateway_error(
            "OpenRouter error (400): messages too long"
        ));
        assert!(!is_retryable_gateway_error(
            "OpenRouter error (402): payment required"
        ));
    }
}
