//! Router error types

use super::ProviderKind;

/// Maximum number of characters of a provider error body kept in messages.
const ERROR_BODY_LIMIT: usize = 500;

/// Top-level error type for the router.
///
/// Provider HTTP failures render as `"<Provider> error (<status>): <body>"`
/// so the status can be parsed back out of the message during fallback
/// classification.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Non-success HTTP status from a provider endpoint
    #[error("{provider} error ({status}): {body}")]
    Api {
        provider: ProviderKind,
        status: u16,
        body: String,
    },

    /// Connection failure or timeout before a status was received
    #[error("{provider} network error: {message}")]
    Network {
        provider: ProviderKind,
        message: String,
    },

    /// Provider returned 2xx but the response envelope was not usable
    #[error("{provider} response parse error: {message}")]
    Envelope {
        provider: ProviderKind,
        message: String,
    },

    /// Request failed local validation before any call was made
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or unusable configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Structured output was requested but no JSON value could be extracted
    /// from the generated text
    #[error("no JSON value found in model output")]
    NoJsonFound,

    /// Every phase, provider, and candidate model has been exhausted
    #[error("Failed across all providers: {0}")]
    AllProvidersFailed(String),
}

impl RouterError {
    /// Build an API error, truncating the raw body to a parseable prefix.
    pub fn api(provider: ProviderKind, status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = if body.chars().count() > ERROR_BODY_LIMIT {
            body.chars().take(ERROR_BODY_LIMIT).collect()
        } else {
            body
        };
        Self::Api {
            provider,
            status,
            body,
        }
    }

    pub fn network(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Network {
            provider,
            message: message.into(),
        }
    }

    pub fn envelope(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Envelope {
            provider,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
