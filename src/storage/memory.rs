//! In-memory record store
//!
//! Used by tests and by embedders that run without a remote store. Inserted
//! rows are retained so tests can assert on the audit trail.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{RecordStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<(String, String), Value>>,
    inserts: Mutex<Vec<(String, Value)>>,
    fail_lookups: Mutex<bool>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a keyed record, as if it had been provisioned in the store.
    pub fn put_record(&self, table: &str, key: &str, record: Value) {
        self.records
            .lock()
            .insert((table.to_string(), key.to_string()), record);
    }

    /// All rows inserted into `table`, in insertion order.
    pub fn inserted_rows(&self, table: &str) -> Vec<Value> {
        self.inserts
            .lock()
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, row)| row.clone())
            .collect()
    }

    /// Make subsequent lookups fail, to exercise store-outage handling.
    pub fn fail_lookups(&self, fail: bool) {
        *self.fail_lookups.lock() = fail;
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_record(&self, table: &str, key: &str) -> Result<Option<Value>, StoreError> {
        if *self.fail_lookups.lock() {
            return Err(StoreError::Request("simulated store outage".into()));
        }
        Ok(self
            .records
            .lock()
            .get(&(table.to_string(), key.to_string()))
            .cloned())
    }

    async fn insert_record(&self, table: &str, row: Value) -> Result<(), StoreError> {
        self.inserts.lock().push((table.to_string(), row));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_keyed_lookup() {
        let store = MemoryRecordStore::new();
        store.put_record("provider_settings", "openrouter", json!({"api_key": "k"}));

        let record = store
            .get_record("provider_settings", "openrouter")
            .await
            .unwrap();
        assert_eq!(record, Some(json!({"api_key": "k"})));

        let missing = store.get_record("provider_settings", "openai").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_inserts_are_retained_per_table() {
        let store = MemoryRecordStore::new();
        store.insert_record("audit", json!({"n": 1})).await.unwrap();
        store.insert_record("other", json!({"n": 2})).await.unwrap();
        store.insert_record("audit", json!({"n": 3})).await.unwrap();

        let rows = store.inserted_rows("audit");
        assert_eq!(rows, vec![json!({"n": 1}), json!({"n": 3})]);
    }

    #[tokio::test]
    async fn test_simulated_outage() {
        let store = MemoryRecordStore::new();
        store.fail_lookups(true);
        assert!(store.get_record("t", "k").await.is_err());
    }
}
