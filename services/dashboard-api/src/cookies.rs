//! Cookie parsing and `Set-Cookie` construction
//!
//! Values are percent-encoded on the way out and decoded on the way in, so
//! base64 payloads (`+`, `/`, `=`) survive any browser.

use std::time::Duration;

use axum::http::HeaderMap;
use axum::http::header::COOKIE;

/// Base64 JSON credential bundle (cookie storage mode).
pub const TOKENS_COOKIE: &str = "google_tokens";
/// Random session id (session storage mode).
pub const SESSION_COOKIE: &str = "google_session";
/// CSRF state for an in-flight consent redirect.
pub const STATE_COOKIE: &str = "google_oauth_state";

pub const CREDENTIAL_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);
pub const STATE_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Read a cookie from every `Cookie` header on the request.
pub fn get(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .and_then(|(_, v)| urlencoding::decode(v).ok())
        .map(|v| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// Attributes shared by every cookie the dashboard sets.
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl CookiePolicy {
    /// `Set-Cookie` value for an httpOnly, SameSite=Lax cookie.
    pub fn set(&self, name: &str, value: &str, max_age: Duration) -> String {
        let mut cookie = format!(
            "{name}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            urlencoding::encode(value),
            max_age.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that expires the cookie immediately.
    pub fn clear(&self, name: &str) -> String {
        self.set(name, "", Duration::ZERO)
    }
}
