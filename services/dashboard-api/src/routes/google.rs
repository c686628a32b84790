//! Google-backed dashboard data
//!
//! Each handler resolves a token through the accessor first. No token means
//! `401 {"needsAuth": true}` and the UI offers to reconnect.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;

use crate::AppState;
use crate::credentials::ResolvedToken;
use crate::error::ApiError;
use crate::routes::set_cookies;

const MAX_RESULTS: u32 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    max_results: Option<u32>,
    q: Option<String>,
    include_body: Option<bool>,
}

impl ListParams {
    fn limit(&self, default: u32) -> u32 {
        self.max_results.unwrap_or(default).clamp(1, MAX_RESULTS)
    }
}

async fn resolve(state: &AppState, headers: &HeaderMap) -> Result<ResolvedToken, ApiError> {
    state
        .credentials
        .access_token(&state.accessor, headers)
        .await
        .ok_or(ApiError::NeedsAuth)
}

/// Render an upstream result. A refreshed credential is re-issued on both
/// paths so a failing upstream does not force another refresh next request.
fn respond(token: ResolvedToken, result: integrations::Result<serde_json::Value>) -> Response {
    let cookies = set_cookies(token.set_cookies);
    match result {
        Ok(body) => (cookies, Json(body)).into_response(),
        Err(e) => (cookies, ApiError::from(e)).into_response(),
    }
}

pub async fn calendar_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let token = resolve(&state, &headers).await?;
    let time_min = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let result = state
        .google
        .upcoming_events(&token.access_token, &time_min, params.limit(10))
        .await
        .map(|events| serde_json::json!({ "events": events }));
    Ok(respond(token, result))
}

pub async fn gmail_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let token = resolve(&state, &headers).await?;
    let query = params.q.as_deref().unwrap_or("in:inbox");
    let result = state
        .google
        .recent_messages(
            &token.access_token,
            query,
            params.limit(10),
            params.include_body.unwrap_or(false),
        )
        .await
        .map(|messages| serde_json::json!({ "messages": messages }));
    Ok(respond(token, result))
}

pub async fn drive_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let token = resolve(&state, &headers).await?;
    let result = state
        .google
        .recent_files(&token.access_token, params.limit(20))
        .await
        .map(|files| serde_json::json!({ "files": files }));
    Ok(respond(token, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::set_cookies;
    use crate::test_support::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get as route_get;
    use std::collections::HashMap;

    #[test]
    fn limit_is_clamped() {
        let params = ListParams {
            max_results: Some(500),
            ..Default::default()
        };
        assert_eq!(params.limit(10), MAX_RESULTS);
        assert_eq!(ListParams::default().limit(10), 10);
        let zero = ListParams {
            max_results: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.limit(10), 1);
    }

    #[tokio::test]
    async fn every_google_route_needs_auth_without_cookie() {
        for uri in ["/api/calendar/events", "/api/gmail/messages", "/api/drive/files"] {
            let response = get(TestState::new().router(), uri, None).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            let json = body_json(response).await;
            assert_eq!(json["needsAuth"], true, "{uri}");
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn calendar_uses_resolved_token() {
        let upstream = serve(Router::new().route(
            "/calendar/v3/calendars/primary/events",
            route_get(
                |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(headers["authorization"], "Bearer ya29.fresh");
                    assert!(q["timeMin"].ends_with('Z'));
                    assert_eq!(q["maxResults"], "5");
                    (
                        StatusCode::OK,
                        r#"{"items":[{"id":"e1","summary":"Call Lune",
                            "start":{"dateTime":"2026-10-20T09:00:00Z"},
                            "end":{"dateTime":"2026-10-20T09:30:00Z"}}]}"#,
                    )
                },
            ),
        ))
        .await;
        let router = TestState::new().upstream(&upstream).router();

        let response = get(
            router,
            "/api/calendar/events?maxResults=5",
            Some(&tokens_cookie(&fresh_bundle())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["events"][0]["title"], "Call Lune");
        assert_eq!(json["events"][0]["allDay"], false);
    }

    #[tokio::test]
    async fn drive_refreshes_expired_token_first() {
        let token = token_server(
            StatusCode::OK,
            r#"{"access_token":"ya29.renewed","expires_in":3599}"#,
        )
        .await;
        let upstream = serve(Router::new().route(
            "/drive/v3/files",
            route_get(|headers: HeaderMap| async move {
                assert_eq!(headers["authorization"], "Bearer ya29.renewed");
                (StatusCode::OK, r#"{"files":[]}"#)
            }),
        ))
        .await;
        let router = TestState::new()
            .token_endpoint(&token)
            .upstream(&upstream)
            .router();

        let response = get(
            router,
            "/api/drive/files",
            Some(&tokens_cookie(&expired_bundle(Some("1//r")))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(set_cookies(&response).len(), 1, "refreshed bundle re-issued");
        assert_eq!(body_json(response).await["files"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn refreshed_token_survives_upstream_failure() {
        let token = token_server(
            StatusCode::OK,
            r#"{"access_token":"ya29.renewed","expires_in":3599}"#,
        )
        .await;
        let upstream = serve(Router::new().route(
            "/drive/v3/files",
            route_get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "backendError") }),
        ))
        .await;
        let router = TestState::new()
            .token_endpoint(&token)
            .upstream(&upstream)
            .router();

        let response = get(
            router,
            "/api/drive/files",
            Some(&tokens_cookie(&expired_bundle(Some("1//r")))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        let bundle = google_auth::codec::decode(
            &urlencoding::decode(cookie_pair(&cookies[0]).trim_start_matches("google_tokens="))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(bundle.access_token, "ya29.renewed");
        assert_eq!(bundle.refresh_token.as_deref(), Some("1//r"));
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let upstream = serve(Router::new().route(
            "/gmail/v1/users/me/messages",
            route_get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "backendError") }),
        ))
        .await;
        let router = TestState::new().upstream(&upstream).router();

        let response = get(
            router,
            "/api/gmail/messages",
            Some(&tokens_cookie(&fresh_bundle())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("gmail returned 500"));
    }

    #[tokio::test]
    async fn google_rejecting_token_asks_for_reconnect() {
        let upstream = serve(Router::new().route(
            "/drive/v3/files",
            route_get(|| async { (StatusCode::UNAUTHORIZED, "Invalid Credentials") }),
        ))
        .await;
        let router = TestState::new().upstream(&upstream).router();

        let response = get(
            router,
            "/api/drive/files",
            Some(&tokens_cookie(&fresh_bundle())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["needsAuth"], true);
    }
}
