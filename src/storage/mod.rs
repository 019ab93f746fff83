//! Record-store collaborators
//!
//! The router treats its configuration/audit persistence as an external
//! key/record store reached through the [`RecordStore`] trait: one keyed
//! lookup for provider settings and one append-only insert for audit rows.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;

pub use memory::MemoryRecordStore;
pub use rest::RestRecordStore;

/// Errors surfaced by a record store. Callers in this crate treat lookups as
/// optional (missing config falls back to the environment) and audit inserts
/// as best-effort, so these rarely propagate past a log line.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store request failed: {0}")]
    Request(String),

    #[error("record store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("record store returned malformed payload: {0}")]
    Malformed(String),
}

/// External record store used for provider settings and audit rows.
///
/// Both operations are assumed idempotent-safe to retry at the caller's
/// discretion; this crate does not retry them.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the record with the given key from `table`, or `None` when no
    /// such record exists.
    async fn get_record(&self, table: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Append one row to `table`.
    async fn insert_record(&self, table: &str, row: Value) -> Result<(), StoreError>;
}
