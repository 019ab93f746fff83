//! HTTP record store client
//!
//! Speaks the PostgREST-style convention used by hosted record stores:
//! `GET {base}/{table}?key=eq.{key}` for keyed lookups and a plain
//! `POST {base}/{table}` for inserts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;

use super::{RecordStore, StoreError};

/// Column used as the lookup key in settings tables.
const KEY_COLUMN: &str = "key";

#[derive(Debug, Clone)]
pub struct RestRecordStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestRecordStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = ClientBuilder::new()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| StoreError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn get_record(&self, table: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[(KEY_COLUMN, format!("eq.{key}")), ("limit", "1".into())])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<Value> =
            serde_json::from_str(&body).map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    async fn insert_record(&self, table: &str, row: Value) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
