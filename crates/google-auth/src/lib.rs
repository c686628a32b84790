//! Google OAuth credential plumbing
//!
//! Covers the whole lifetime of a user's Google credential bundle: consent
//! URL, code exchange, refresh, the cookie codec, sealed server-side session
//! storage, and the accessor that hands out a usable access token. The crate
//! has no dependency on the HTTP server; it can be tested on its own.
//!
//! Credential flow:
//! 1. Route calls `OAuthClient::authorization_url()` with a fresh `generate_state()`
//! 2. Google redirects back with a code; route calls `OAuthClient::exchange_code()`
//! 3. `TokenResponse::into_bundle()` fixes the absolute expiry
//! 4. Bundle stored via `codec::encode()` (cookie) or `SessionStore::create()`
//! 5. Each Google-backed request calls `TokenAccessor::access_token()`
//! 6. Refreshed bundles handed back in `AccessGrant::refreshed` for the caller to persist
//! 7. `spawn_prune_task()` drops idle sessions in the background

pub mod accessor;
pub mod authorize;
pub mod bundle;
pub mod client;
pub mod codec;
pub mod constants;
pub mod error;
pub mod seal;
pub mod sessions;
pub mod token;

pub use accessor::{AccessGrant, REFRESH_BUFFER, RefreshOutcome, TokenAccessor, TokenState};
pub use authorize::generate_state;
pub use bundle::{CredentialBundle, now_millis};
pub use client::{Endpoints, OAuthClient};
pub use error::{Error, Result};
pub use seal::Sealer;
pub use sessions::{SessionStore, spawn_prune_task};
pub use token::TokenResponse;
