//! Server-side session storage for sealed credential bundles
//!
//! Maps a random session id (the only thing the browser holds) to a sealed
//! bundle in a JSON file. All writes use atomic temp-file + rename, and a
//! tokio Mutex serializes concurrent callbacks and refresh write-backs.
//! Every mutation is staged on a copy of the map and only becomes visible
//! once the file write succeeded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::authorize::generate_state;
use crate::bundle::{CredentialBundle, now_millis};
use crate::error::{Error, Result};
use crate::seal::Sealer;

/// One stored session. Timestamps are unix milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    sealed: String,
    created_at: u64,
    updated_at: u64,
}

/// Sealed credential sessions keyed by session id.
pub struct SessionStore {
    path: PathBuf,
    sealer: Sealer,
    state: Mutex<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    /// Load sessions from the given file, creating an empty one on cold start.
    pub async fn load(path: PathBuf, sealer: Sealer) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading session file: {e}")))?;
            let sessions: HashMap<String, SessionRecord> = serde_json::from_str(&contents)
                .map_err(|e| Error::SessionParse(format!("parsing session file: {e}")))?;
            info!(path = %path.display(), sessions = sessions.len(), "loaded sessions");
            sessions
        } else {
            info!(path = %path.display(), "session file not found, starting with empty store");
            let sessions = HashMap::new();
            write_atomic(&path, &sessions).await?;
            sessions
        };

        Ok(Self {
            path,
            sealer,
            state: Mutex::new(state),
        })
    }

    /// Store a bundle under a new random session id and return the id.
    pub async fn create(&self, bundle: &CredentialBundle) -> Result<String> {
        let session_id = generate_state();
        let sealed = self.sealer.seal(bundle)?;
        let now = now_millis();

        let mut state = self.state.lock().await;
        let mut next = state.clone();
        next.insert(
            session_id.clone(),
            SessionRecord {
                sealed,
                created_at: now,
                updated_at: now,
            },
        );
        write_atomic(&self.path, &next).await?;
        *state = next;
        debug!(sessions = state.len(), "created session");
        Ok(session_id)
    }

    /// Open the bundle for a session. Unknown ids and undecryptable records
    /// (e.g. after a key rotation) both read as absent.
    pub async fn get(&self, session_id: &str) -> Option<CredentialBundle> {
        let sealed = {
            let state = self.state.lock().await;
            state.get(session_id)?.sealed.clone()
        };
        match self.sealer.open(&sealed) {
            Ok(bundle) => Some(bundle),
            Err(e) => {
                warn!(error = %e, "stored session could not be opened");
                None
            }
        }
    }

    /// Replace the bundle of an existing session after a refresh.
    pub async fn update(&self, session_id: &str, bundle: &CredentialBundle) -> Result<()> {
        let sealed = self.sealer.seal(bundle)?;
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let record = next
            .get_mut(session_id)
            .ok_or_else(|| Error::NotFound("session not in store".into()))?;
        record.sealed = sealed;
        record.updated_at = now_millis();
        write_atomic(&self.path, &next).await?;
        *state = next;
        debug!("updated session");
        Ok(())
    }

    /// Remove a session. Returns whether it existed.
    pub async fn remove(&self, session_id: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.contains_key(session_id) {
            return Ok(false);
        }
        let mut next = state.clone();
        next.remove(session_id);
        write_atomic(&self.path, &next).await?;
        *state = next;
        debug!("removed session");
        Ok(true)
    }

    /// Drop sessions not updated within `max_age_ms`. Returns how many went.
    pub async fn prune(&self, max_age_ms: u64) -> Result<usize> {
        let cutoff = now_millis().saturating_sub(max_age_ms);
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        next.retain(|_, record| record.updated_at >= cutoff);
        let pruned = state.len() - next.len();
        if pruned > 0 {
            write_atomic(&self.path, &next).await?;
            *state = next;
            info!(pruned, "pruned idle sessions");
        }
        Ok(pruned)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Spawn a background task that drops sessions idle for longer than `max_age`.
///
/// Runs every `interval`; the first prune happens one interval after spawn.
/// A failed prune is logged and retried on the next tick.
pub fn spawn_prune_task(
    store: Arc<SessionStore>,
    interval: Duration,
    max_age: Duration,
) -> tokio::task::JoinHandle<()> {
    let max_age_ms = max_age.as_millis() as u64;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = store.prune(max_age_ms).await {
                warn!(error = %e, "session prune failed, will retry next cycle");
            }
        }
    })
}

/// Write sessions to a file atomically with 0600 permissions.
async fn write_atomic(path: &Path, data: &HashMap<String, SessionRecord>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::SessionParse(format!("serializing sessions: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("session path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".sessions.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted sessions");
    Ok(())
}
