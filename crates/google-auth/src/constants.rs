//! Google OAuth endpoints and scopes
//!
//! Client id, secret and redirect URI are not constants; they come from the
//! settings resolver at call time.

/// Consent screen
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Token endpoint for code exchange and refresh
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested on every consent: Calendar, Gmail read, full Drive,
/// Docs, and the OpenID profile trio.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/documents",
    "openid",
    "email",
    "profile",
];

/// Path of the callback route, appended to the public URL when no redirect
/// URI is configured.
pub const CALLBACK_PATH: &str = "/api/auth/callback";
