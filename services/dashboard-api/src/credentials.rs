//! Where a user's Google credential bundle lives between requests
//!
//! In cookie mode the bundle itself is the `google_tokens` cookie. In session
//! mode it is sealed in the `SessionStore` and the browser only carries the
//! session id. Either way a cookie that cannot be decoded reads as no cookie.

use std::sync::Arc;

use axum::http::HeaderMap;
use google_auth::{CredentialBundle, SessionStore, TokenAccessor, codec};
use tracing::{debug, warn};

use crate::cookies::{self, CREDENTIAL_MAX_AGE, CookiePolicy, SESSION_COOKIE, TOKENS_COOKIE};

pub enum Storage {
    Cookie,
    Session(Arc<SessionStore>),
}

pub struct Credentials {
    storage: Storage,
    policy: CookiePolicy,
    persist_refreshed: bool,
}

/// Access token resolved for one request, plus any `Set-Cookie` values the
/// response must carry.
#[derive(Debug)]
pub struct ResolvedToken {
    pub access_token: String,
    pub set_cookies: Vec<String>,
}

impl Credentials {
    pub fn new(storage: Storage, policy: CookiePolicy, persist_refreshed: bool) -> Self {
        Self {
            storage,
            policy,
            persist_refreshed,
        }
    }

    pub fn policy(&self) -> CookiePolicy {
        self.policy
    }

    pub fn mode(&self) -> &'static str {
        match self.storage {
            Storage::Cookie => "cookie",
            Storage::Session(_) => "session",
        }
    }

    /// The stored bundle for this request, if any.
    pub async fn load(&self, headers: &HeaderMap) -> Option<CredentialBundle> {
        match &self.storage {
            Storage::Cookie => {
                let raw = cookies::get(headers, TOKENS_COOKIE)?;
                let bundle = codec::decode(&raw);
                if bundle.is_none() {
                    debug!("google_tokens cookie did not decode, treating as absent");
                }
                bundle
            }
            Storage::Session(store) => {
                let id = cookies::get(headers, SESSION_COOKIE)?;
                store.get(&id).await
            }
        }
    }

    /// Store a freshly issued bundle and return the cookies to set.
    ///
    /// Session mode always mints a new session id and then drops the previous
    /// one, so a failed write leaves the existing connection in place.
    pub async fn store(
        &self,
        headers: &HeaderMap,
        bundle: &CredentialBundle,
    ) -> google_auth::Result<Vec<String>> {
        match &self.storage {
            Storage::Cookie => Ok(vec![self.policy.set(
                TOKENS_COOKIE,
                &codec::encode(bundle),
                CREDENTIAL_MAX_AGE,
            )]),
            Storage::Session(store) => {
                let id = store.create(bundle).await?;
                if let Some(previous) = cookies::get(headers, SESSION_COOKIE) {
                    if let Err(e) = store.remove(&previous).await {
                        warn!(error = %e, "failed to remove replaced session");
                    }
                }
                Ok(vec![self.policy.set(SESSION_COOKIE, &id, CREDENTIAL_MAX_AGE)])
            }
        }
    }

    /// Forget the stored bundle and return the cookies that clear it.
    pub async fn clear(&self, headers: &HeaderMap) -> Vec<String> {
        if let Storage::Session(store) = &self.storage {
            if let Some(id) = cookies::get(headers, SESSION_COOKIE) {
                if let Err(e) = store.remove(&id).await {
                    warn!(error = %e, "failed to remove session on logout");
                }
            }
        }
        vec![
            self.policy.clear(TOKENS_COOKIE),
            self.policy.clear(SESSION_COOKIE),
        ]
    }

    /// Resolve a usable access token, persisting a refreshed bundle when
    /// configured to.
    pub async fn access_token(
        &self,
        accessor: &TokenAccessor,
        headers: &HeaderMap,
    ) -> Option<ResolvedToken> {
        let bundle = self.load(headers).await;
        let grant = accessor.access_token(bundle.as_ref()).await?;

        let mut set_cookies = Vec::new();
        if let Some(updated) = grant.refreshed.as_ref().filter(|_| self.persist_refreshed) {
            match &self.storage {
                Storage::Cookie => set_cookies.push(self.policy.set(
                    TOKENS_COOKIE,
                    &codec::encode(updated),
                    CREDENTIAL_MAX_AGE,
                )),
                Storage::Session(store) => {
                    // The id is present: a bundle was loaded through it.
                    if let Some(id) = cookies::get(headers, SESSION_COOKIE) {
                        if let Err(e) = store.update(&id, updated).await {
                            warn!(error = %e, "failed to persist refreshed google tokens");
                        }
                    }
                }
            }
        }

        Some(ResolvedToken {
            access_token: grant.access_token,
            set_cookies,
        })
    }
}
