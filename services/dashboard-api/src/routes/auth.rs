//! Google consent flow and connection status
//!
//! - `GET  /api/auth/google`   302 to the consent screen, sets the CSRF state cookie
//! - `GET  /api/auth/callback` exchanges the code, stores the bundle, 302 to the dashboard
//! - `GET  /api/auth/status`   `{"google": bool}`, refreshing when needed
//! - `POST /api/auth/logout`   forgets the bundle

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use google_auth::{generate_state, now_millis};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::AppState;
use crate::cookies::{self, STATE_COOKIE, STATE_MAX_AGE};
use crate::metrics::record_exchange;
use crate::routes::{redirect, set_cookies};

const CONNECTED_LOCATION: &str = "/dashboard?google=connected";

fn settings_error(message: &str) -> String {
    format!("/settings?error={}", urlencoding::encode(message))
}

pub async fn start(State(state): State<AppState>) -> Response {
    let csrf = generate_state();
    match state.oauth.authorization_url(Some(&csrf)).await {
        Ok(url) => {
            info!("redirecting to google consent screen");
            let cookie = state.credentials.policy().set(STATE_COOKIE, &csrf, STATE_MAX_AGE);
            redirect(&url, vec![cookie])
        }
        Err(e) => {
            warn!(error = %e, "cannot start google consent flow");
            redirect(&settings_error(&e.to_string()), Vec::new())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    state: Option<String>,
}

pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let clear_state = state.credentials.policy().clear(STATE_COOKIE);

    if let Some(reason) = params.error {
        warn!(reason = %reason, "google consent returned an error");
        record_exchange("denied");
        return redirect(&settings_error(&reason), vec![clear_state]);
    }

    let expected = cookies::get(&headers, STATE_COOKIE);
    if expected.is_none() || expected != params.state {
        warn!(
            has_cookie = expected.is_some(),
            "oauth state mismatch, rejecting callback"
        );
        record_exchange("state_mismatch");
        return redirect(&settings_error("invalid_state"), vec![clear_state]);
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        record_exchange("denied");
        return redirect(&settings_error("missing_code"), vec![clear_state]);
    };

    let bundle = match state.oauth.exchange_code(&code).await {
        Ok(response) => response.into_bundle(now_millis()),
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "google code exchange failed");
            record_exchange("failure");
            return redirect(&settings_error(&e.to_string()), vec![clear_state]);
        }
    };
    if bundle.refresh_token.is_none() {
        warn!("google issued no refresh token, the connection lapses when the access token expires");
    }

    match state.credentials.store(&headers, &bundle).await {
        Ok(mut cookies) => {
            record_exchange("success");
            info!(
                storage = state.credentials.mode(),
                expires_at = bundle.expires_at,
                "google account connected"
            );
            cookies.push(clear_state);
            redirect(CONNECTED_LOCATION, cookies)
        }
        Err(e) => {
            error!(error = %e, "failed to store google credentials");
            record_exchange("failure");
            redirect(&settings_error("credential_storage_failed"), vec![clear_state])
        }
    }
}

pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let resolved = state
        .credentials
        .access_token(&state.accessor, &headers)
        .await;
    let connected = resolved.is_some();
    let cookies = resolved.map(|r| r.set_cookies).unwrap_or_default();
    (
        set_cookies(cookies),
        Json(serde_json::json!({ "google": connected })),
    )
        .into_response()
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookies = state.credentials.clear(&headers).await;
    info!("google account disconnected");
    (
        set_cookies(cookies),
        Json(serde_json::json!({ "google": false })),
    )
        .into_response()
}
