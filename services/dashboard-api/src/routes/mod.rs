//! Dashboard API routes

pub mod auth;
pub mod crm;
pub mod google;

use axum::Router;
use axum::http::StatusCode;
use axum::http::header::{HeaderName, LOCATION, SET_COOKIE};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::{get, post};

use crate::AppState;

pub fn api() -> Router<AppState> {
    Router::new()
        .route("/api/auth/google", get(auth::start))
        .route("/api/auth/callback", get(auth::callback))
        .route("/api/auth/status", get(auth::status))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/calendar/events", get(google::calendar_events))
        .route("/api/gmail/messages", get(google::gmail_messages))
        .route("/api/drive/files", get(google::drive_files))
        .route("/api/crm/clients", get(crm::clients))
}

/// One `Set-Cookie` header per value.
pub(crate) fn set_cookies(cookies: Vec<String>) -> AppendHeaders<Vec<(HeaderName, String)>> {
    AppendHeaders(cookies.into_iter().map(|c| (SET_COOKIE, c)).collect())
}

/// 302 to `location`, carrying `cookies`.
pub(crate) fn redirect(location: &str, cookies: Vec<String>) -> Response {
    (
        StatusCode::FOUND,
        [(LOCATION, location.to_string())],
        set_cookies(cookies),
    )
        .into_response()
}
