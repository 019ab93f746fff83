//! Provider settings access with a short-lived gateway cache
//!
//! The gateway's combined credential + policy record is read on every
//! request, so it is cached behind a timestamped snapshot with a 60-second
//! TTL. Direct-provider records are only consulted on fallback and are
//! fetched fresh each time. Store failures never propagate: the router must
//! still be able to fall back to environment credentials.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::warn;

use crate::core::types::ProviderKind;
use crate::storage::RecordStore;

/// Credential and raw policy record for one provider, as stored remotely.
/// Both fields are `None` when the record is missing or the store is down.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub raw_policy: Option<Value>,
}

impl ProviderSettings {
    fn from_record(record: Value) -> Self {
        let api_key = record
            .get("api_key")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Self {
            api_key,
            raw_policy: Some(record),
        }
    }
}

struct CachedSettings {
    fetched_at: Instant,
    settings: ProviderSettings,
}

/// Reads provider records from the external store.
///
/// Concurrent readers either see a fully-populated snapshot or trigger a
/// refresh; duplicate concurrent refreshes are harmless (last write wins on
/// a complete snapshot), and a stale read within the TTL is by design.
pub struct SettingsStore {
    store: Arc<dyn RecordStore>,
    table: String,
    ttl: Duration,
    gateway_cache: Mutex<Option<CachedSettings>>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            table: table.into(),
            ttl,
            gateway_cache: Mutex::new(None),
        }
    }

    /// Fetch the settings record for a provider. Gateway lookups go through
    /// the TTL cache; everything else hits the store directly.
    pub async fn provider_settings(&self, kind: ProviderKind) -> ProviderSettings {
        if kind != ProviderKind::OpenRouter {
            return self.fetch(kind).await;
        }

        {
            let cache = self.gateway_cache.lock();
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return cached.settings.clone();
                }
            }
        }

        let settings = self.fetch(kind).await;
        *self.gateway_cache.lock() = Some(CachedSettings {
            fetched_at: Instant::now(),
            settings: settings.clone(),
        });
        settings
    }

    async fn fetch(&self, kind: ProviderKind) -> ProviderSettings {
        match self.store.get_record(&self.table, kind.as_str()).await {
            Ok(Some(record)) => ProviderSettings::from_record(record),
            Ok(None) => ProviderSettings::default(),
            Err(err) => {
                warn!(provider = kind.as_str(), error = %err, "provider settings lookup failed");
                ProviderSettings::default()
            }
        }
    }
}
