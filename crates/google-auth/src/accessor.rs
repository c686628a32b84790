//! Access token resolution with transparent refresh
//!
//! States of a stored credential, judged against the 5-minute buffer:
//! - `NoCookie` → nothing stored (or it failed to decode)
//! - `ValidToken` → `expires_at > now + 5 min`, returned as-is
//! - `ExpiredRefreshable` → refresh attempted; failure reads as not connected
//! - `ExpiredUnrefreshable` → not connected, no network call
//!
//! The accessor never writes storage. A successful refresh is handed back in
//! `AccessGrant::refreshed` and the caller decides whether to persist it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::bundle::{CredentialBundle, now_millis};
use crate::client::OAuthClient;
use crate::error::Error;

/// Tokens expiring within this window are refreshed before use.
pub const REFRESH_BUFFER: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    NoCookie,
    ValidToken,
    ExpiredRefreshable,
    ExpiredUnrefreshable,
}

impl TokenState {
    pub fn classify(bundle: Option<&CredentialBundle>, now_ms: u64) -> Self {
        match bundle {
            None => TokenState::NoCookie,
            Some(b) if b.is_fresh(now_ms, REFRESH_BUFFER.as_millis() as u64) => {
                TokenState::ValidToken
            }
            Some(b) if b.can_refresh() => TokenState::ExpiredRefreshable,
            Some(_) => TokenState::ExpiredUnrefreshable,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TokenState::NoCookie => "no_cookie",
            TokenState::ValidToken => "valid",
            TokenState::ExpiredRefreshable => "expired_refreshable",
            TokenState::ExpiredUnrefreshable => "expired_unrefreshable",
        }
    }
}

/// A usable access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub access_token: String,
    /// Set when the token was just refreshed; the full replacement bundle.
    pub refreshed: Option<CredentialBundle>,
}

/// Outcome of a refresh attempt, for callers that count them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    Revoked,
    Failed,
}

impl RefreshOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Refreshed => "refreshed",
            RefreshOutcome::Revoked => "revoked",
            RefreshOutcome::Failed => "failed",
        }
    }
}

pub struct TokenAccessor {
    oauth: Arc<OAuthClient>,
    on_refresh: Option<Box<dyn Fn(RefreshOutcome) + Send + Sync>>,
}

impl TokenAccessor {
    pub fn new(oauth: Arc<OAuthClient>) -> Self {
        Self {
            oauth,
            on_refresh: None,
        }
    }

    /// Register a hook called after every refresh attempt.
    pub fn with_refresh_hook(mut self, hook: impl Fn(RefreshOutcome) + Send + Sync + 'static) -> Self {
        self.on_refresh = Some(Box::new(hook));
        self
    }

    /// Return a usable access token for `bundle`, refreshing if needed.
    ///
    /// `None` means "Google not connected": callers answer 401 and prompt a
    /// reconnect rather than retrying.
    pub async fn access_token(&self, bundle: Option<&CredentialBundle>) -> Option<AccessGrant> {
        let now = now_millis();
        let state = TokenState::classify(bundle, now);
        debug!(state = state.label(), "resolving google token");

        let bundle = match (state, bundle) {
            (TokenState::ValidToken, Some(b)) => {
                return Some(AccessGrant {
                    access_token: b.access_token.clone(),
                    refreshed: None,
                });
            }
            (TokenState::ExpiredRefreshable, Some(b)) => b,
            _ => return None,
        };

        let refresh_token = bundle.refresh_token.as_deref().unwrap_or_default();
        match self.oauth.refresh(refresh_token).await {
            Ok(response) => {
                let updated = response.refreshed(bundle, now_millis());
                info!(expires_at = updated.expires_at, "google access token refreshed");
                self.report(RefreshOutcome::Refreshed);
                Some(AccessGrant {
                    access_token: updated.access_token.clone(),
                    refreshed: Some(updated),
                })
            }
            Err(Error::Revoked(msg)) => {
                warn!(error = %msg, "google refresh token revoked, treating as disconnected");
                self.report(RefreshOutcome::Revoked);
                None
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "google token refresh failed");
                self.report(RefreshOutcome::Failed);
                None
            }
        }
    }

    fn report(&self, outcome: RefreshOutcome) {
        if let Some(hook) = &self.on_refresh {
            hook(outcome);
        }
    }
}
