//! Backing key-value tables for the settings cache
//!
//! `SettingsStore` uses `Pin<Box<dyn Future>>` returns so the cache can hold
//! an `Arc<dyn SettingsStore>` and tests can swap in `MemoryStore`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::Secret;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// One row of the settings table. `value` may be NULL in the table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SettingRow {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl SettingRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// A source of setting rows.
pub trait SettingsStore: Send + Sync {
    /// Identifier for logging (e.g. "supabase", "memory")
    fn id(&self) -> &str;

    /// Read every row of the table.
    fn fetch_all(&self) -> Pin<Box<dyn Future<Output = Result<Vec<SettingRow>>> + Send + '_>>;
}

/// In-process table. Used when no backend is configured, and in tests.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<SettingRow>>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new(rows: Vec<SettingRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Insert or replace a row. Cached readers see it after their next reload.
    pub fn set(&self, key: &str, value: &str) {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        match rows.iter_mut().find(|r| r.key == key) {
            Some(row) => row.value = Some(value.to_owned()),
            None => rows.push(SettingRow::new(key, value)),
        }
    }

    /// Number of times `fetch_all` has been called.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl SettingsStore for MemoryStore {
    fn id(&self) -> &str {
        "memory"
    }

    fn fetch_all(&self) -> Pin<Box<dyn Future<Output = Result<Vec<SettingRow>>> + Send + '_>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::Relaxed);
            let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
            Ok(rows.clone())
        })
    }
}

/// Supabase PostgREST table (`GET /rest/v1/{table}?select=key,value`).
///
/// Authenticates with the service-role key, which bypasses row-level
/// security; it is read from the environment only, never from the table.
pub struct SupabaseStore {
    client: reqwest::Client,
    endpoint: String,
    service_key: Secret<String>,
}

impl SupabaseStore {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        table: &str,
        service_key: Secret<String>,
    ) -> Self {
        let endpoint = format!(
            "{}/rest/v1/{}?select=key,value",
            base_url.trim_end_matches('/'),
            table
        );
        Self {
            client,
            endpoint,
            service_key,
        }
    }
}

impl SettingsStore for SupabaseStore {
    fn id(&self) -> &str {
        "supabase"
    }

    fn fetch_all(&self) -> Pin<Box<dyn Future<Output = Result<Vec<SettingRow>>> + Send + '_>> {
        Box::pin(async move {
            let key = self.service_key.expose();
            let response = self
                .client
                .get(&self.endpoint)
                .header("apikey", key.as_str())
                .bearer_auth(key)
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|e| Error::Http(format!("settings request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("<no body>"));
                return Err(Error::Backend {
                    status: status.as_u16(),
                    body,
                });
            }

            let rows = response
                .json::<Vec<SettingRow>>()
                .await
                .map_err(|e| Error::Parse(e.to_string()))?;
            debug!(rows = rows.len(), "fetched settings rows");
            Ok(rows)
        })
    }
}
