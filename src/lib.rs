//! # ai-router
//!
//! Multi-provider LLM request router: sends a completion request to one of
//! several interchangeable inference providers, selecting models per task
//! category, retrying across providers and models on failure, normalizing
//! heterogeneous response shapes into one contract, and recording every
//! attempt for audit.
//!
//! The gateway provider (OpenRouter) is tried first across an ordered
//! candidate model list resolved from policy; on exhaustion the direct
//! providers (OpenAI, Anthropic, Gemini) are tried in fixed order.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ai_router::{Router, RouteRequest, TaskCategory, system_message, user_message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::from_env()?;
//!
//!     let request = RouteRequest::new(vec![
//!         system_message("You are a concise analyst."),
//!         user_message("Summarize Q3 pipeline health."),
//!     ])
//!     .with_task(TaskCategory::Analysis)
//!     .expect_json();
//!
//!     let response = router.complete(request).await?;
//!     println!("{} via {}: {}", response.provider, response.model, response.text);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod storage;
pub mod utils;

pub use config::RouterConfig;
pub use core::normalize::extract_json;
pub use core::policy::{AUTO_ROUTING_MODEL, ProviderSettings, resolve_candidate_models};
pub use core::router::Router;
pub use core::types::errors::RouterError;
pub use core::types::{
    Message, MessageRole, ProviderKind, RouteRequest, RouteResponse, TaskCategory,
    assistant_message, system_message, user_message,
};
pub use storage::{MemoryRecordStore, RecordStore, RestRecordStore, StoreError};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
