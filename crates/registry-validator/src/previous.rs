//! Lookup of the previously accepted version of a record.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::network::RecordLocation;

/// Source of previously accepted records, keyed by record location
#[async_trait]
pub trait PreviousRecordSource: Send + Sync {
    /// The accepted record at `location`, or `None` if nothing has been
    /// accepted there yet
    async fn fetch_previous(&self, location: &RecordLocation) -> RegistryResult<Option<JsonValue>>;
}

/// Fetches records from the published registry's raw content over HTTP
pub struct RawContentSource {
    base_url: String,
    http_client: HttpClient,
}

impl RawContentSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: HttpClient::new(),
        }
    }

    /// URL of the published copy of the record at `location`
    pub fn url_for(&self, location: &RecordLocation) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            location.registry_path().trim_start_matches('/')
        )
    }
}

#[async_trait]
impl PreviousRecordSource for RawContentSource {
    async fn fetch_previous(&self, location: &RecordLocation) -> RegistryResult<Option<JsonValue>> {
        let url = self.url_for(location);
        debug!(%url, "fetching previous record");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| RegistryError::PreviousFetch(format!("{}: {}", url, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RegistryError::PreviousFetch(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RegistryError::PreviousFetch(format!("Failed to read response: {}", e)))?;

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| RegistryError::MalformedPrevious(e.to_string()))
    }
}

/// Fixed set of accepted records, keyed by registry path (`data/...`)
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecords {
    records: HashMap<String, JsonValue>,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, registry_path: impl Into<String>, record: JsonValue) {
        self.records.insert(registry_path.into(), record);
    }

    pub fn with_record(mut self, registry_path: impl Into<String>, record: JsonValue) -> Self {
        self.insert(registry_path, record);
        self
    }
}

#[async_trait]
impl PreviousRecordSource for InMemoryRecords {
    async fn fetch_previous(&self, location: &RecordLocation) -> RegistryResult<Option<JsonValue>> {
        Ok(self.records.get(location.registry_path()).cloned())
    }
}

/// A registry with nothing accepted yet
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreviousRecords;

#[async_trait]
impl PreviousRecordSource for NoPreviousRecords {
    async fn fetch_previous(&self, _location: &RecordLocation) -> RegistryResult<Option<JsonValue>> {
        Ok(None)
    }
}
