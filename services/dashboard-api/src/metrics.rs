//! Prometheus metrics exposition
//!
//! - `dashboard_requests_total` (counter): labels `route`, `status`
//! - `dashboard_request_duration_seconds` (histogram): label `route`
//! - `google_oauth_exchanges_total` (counter): label `outcome`
//! - `google_token_refreshes_total` (counter): label `outcome`
//! - `upstream_errors_total` (counter): label `service`

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tracing::{Instrument, debug, info_span};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

fn builder() -> PrometheusBuilder {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("dashboard_request_duration_seconds".to_string()),
            DURATION_BUCKETS,
        )
        .expect("failed to set histogram buckets")
}

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> PrometheusHandle {
    builder()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Handle that renders without being the global recorder, for tests.
#[cfg(test)]
pub fn test_handle() -> PrometheusHandle {
    builder().build_recorder().handle()
}

/// Record a completed request with its matched route and status code.
pub fn record_request(route: &str, status: u16, duration_secs: f64) {
    metrics::counter!(
        "dashboard_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("dashboard_request_duration_seconds", "route" => route.to_string())
        .record(duration_secs);
}

pub fn record_exchange(outcome: &'static str) {
    metrics::counter!("google_oauth_exchanges_total", "outcome" => outcome).increment(1);
}

pub fn record_refresh(outcome: google_auth::RefreshOutcome) {
    metrics::counter!("google_token_refreshes_total", "outcome" => outcome.label()).increment(1);
}

pub fn record_upstream_error(service: &'static str) {
    metrics::counter!("upstream_errors_total", "service" => service).increment(1);
}

/// Middleware timing every request against its route template.
///
/// Each request runs inside a span carrying a fresh request id, which is
/// echoed back in `x-request-id`.
pub async fn track(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        route = %route
    );

    let started = Instant::now();
    let mut response = next.run(request).instrument(span).await;
    let status = response.status().as_u16();
    let elapsed = started.elapsed().as_secs_f64();
    record_request(&route, status, elapsed);
    debug!(request_id = %request_id, route = %route, status, elapsed, "request completed");

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use google_auth::RefreshOutcome;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_request("/health", 200, 0.01);
        record_exchange("success");
        record_refresh(RefreshOutcome::Failed);
        record_upstream_error("gmail");
    }

    #[test]
    fn counters_render_with_labels() {
        let recorder = builder().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_request("/api/auth/status", 200, 0.004);
        record_exchange("failure");
        record_refresh(RefreshOutcome::Revoked);
        record_upstream_error("notion");

        let output = handle.render();
        assert!(output.contains("dashboard_requests_total"));
        assert!(output.contains("route=\"/api/auth/status\""));
        assert!(output.contains("dashboard_request_duration_seconds_bucket"));
        assert!(output.contains("le=\"0.005\""));
        assert!(output.contains("google_oauth_exchanges_total{outcome=\"failure\"} 1"));
        assert!(output.contains("google_token_refreshes_total{outcome=\"revoked\"} 1"));
        assert!(output.contains("upstream_errors_total{service=\"notion\"} 1"));
    }
}
