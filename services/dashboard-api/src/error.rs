//! Per-request errors and their HTTP rendering
//!
//! Handlers return `ApiError` and never propagate anything else: a Google
//! credential that cannot be resolved is a 401 asking the UI to reconnect,
//! an upstream failure is a 502.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Google account not connected")]
    NeedsAuth,

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Upstream(#[from] integrations::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NeedsAuth => StatusCode::UNAUTHORIZED,
            // Google rejected a token we considered valid: consent was revoked.
            ApiError::Upstream(e) if google_rejected(e) => StatusCode::UNAUTHORIZED,
            ApiError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status == StatusCode::UNAUTHORIZED {
            serde_json::json!({ "error": ApiError::NeedsAuth.to_string(), "needsAuth": true })
        } else {
            if let ApiError::Upstream(e) = &self {
                warn!(error = %e, "upstream call failed");
                crate::metrics::record_upstream_error(upstream_service(e));
            }
            serde_json::json!({ "error": self.to_string() })
        };
        (status, axum::Json(body)).into_response()
    }
}

fn google_rejected(error: &integrations::Error) -> bool {
    error.is_unauthorized() && matches!(upstream_service(error), "calendar" | "gmail" | "drive")
}

fn upstream_service(error: &integrations::Error) -> &'static str {
    match error {
        integrations::Error::Upstream { service, .. } => *service,
        integrations::Error::Http(_) => "network",
        integrations::Error::Shape(_) => "shape",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn needs_auth_renders_401_flag() {
        let response = ApiError::NeedsAuth.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["needsAuth"], true);
    }

    #[tokio::test]
    async fn google_401_is_treated_as_disconnected() {
        let err = ApiError::Upstream(integrations::Error::Upstream {
            service: "calendar",
            status: 401,
            body: "Invalid Credentials".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["needsAuth"], true);
    }

    #[tokio::test]
    async fn other_upstream_failures_are_bad_gateway() {
        let err = ApiError::Upstream(integrations::Error::Shape("missing items".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("missing items"));
        assert!(json.get("needsAuth").is_none());
    }

    #[test]
    fn notion_401_is_not_a_google_reconnect() {
        let err = ApiError::Upstream(integrations::Error::Upstream {
            service: "notion",
            status: 401,
            body: "unauthorized".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_configured_names_the_integration() {
        let err = ApiError::NotConfigured("Notion");
        assert_eq!(err.to_string(), "Notion is not configured");
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
