//! TTL cache over a `SettingsStore` with environment fallback
//!
//! The cache is an explicit object shared through `Arc`, not module state.
//! Each process instance keeps its own copy, so two instances can disagree
//! for up to one TTL after a table update.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::key::SettingKey;
use crate::store::SettingsStore;

/// Default time-to-live for cached rows.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Where fallback values come from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// Read the process environment at lookup time.
    #[default]
    Process,
    /// Fixed map, for tests and embedded use.
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    fn lookup(&self, name: &str) -> Option<String> {
        let value = match self {
            EnvSource::Process => std::env::var(name).ok(),
            EnvSource::Fixed(map) => map.get(name).cloned(),
        };
        value.filter(|v| !v.is_empty())
    }
}

struct CacheState {
    values: HashMap<String, String>,
    loaded_at: Option<Instant>,
}

/// Settings resolver.
pub struct Settings {
    store: Arc<dyn SettingsStore>,
    env: EnvSource,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl Settings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            env: EnvSource::default(),
            ttl: DEFAULT_TTL,
            state: Mutex::new(CacheState {
                values: HashMap::new(),
                loaded_at: None,
            }),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    /// Resolve a known setting: table value first, then its env var.
    pub async fn get(&self, key: SettingKey) -> Option<String> {
        if let Some(value) = self.cached(key.as_str()).await {
            return Some(value);
        }
        let value = self.env.lookup(key.env_var());
        if value.is_some() {
            debug!(key = %key, source = "env", "setting resolved");
        }
        value
    }

    /// Drop the cached rows so the next lookup reloads from the store.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.loaded_at = None;
        debug!(store = self.store.id(), "settings cache invalidated");
    }

    async fn cached(&self, name: &str) -> Option<String> {
        let mut state = self.state.lock().await;
        let stale = state
            .loaded_at
            .is_none_or(|loaded| loaded.elapsed() >= self.ttl);
        if stale {
            self.reload(&mut state).await;
        }
        state.values.get(name).filter(|v| !v.is_empty()).cloned()
    }

    /// Replace the cached rows. On failure the old rows stay and the
    /// timestamp still advances, so a down backend is retried once per TTL.
    async fn reload(&self, state: &mut CacheState) {
        match self.store.fetch_all().await {
            Ok(rows) => {
                state.values = rows
                    .into_iter()
                    .filter_map(|row| row.value.map(|value| (row.key, value)))
                    .collect();
                debug!(
                    store = self.store.id(),
                    entries = state.values.len(),
                    "settings cache refreshed"
                );
            }
            Err(e) => {
                warn!(store = self.store.id(), error = %e, "settings refresh failed, using cached and env values");
            }
        }
        state.loaded_at = Some(Instant::now());
    }
}
