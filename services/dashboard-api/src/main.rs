//! Splash Banana dashboard API
//!
//! Single-binary service that:
//! 1. Resolves runtime secrets through the cached settings table
//! 2. Runs the Google OAuth consent/callback flow and stores credentials
//! 3. Serves Calendar, Gmail, Drive and Notion data to the dashboard UI

mod config;
mod cookies;
mod credentials;
mod error;
mod metrics;
mod routes;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use google_auth::{Endpoints, OAuthClient, Sealer, SessionStore, TokenAccessor};
use integrations::{GoogleApi, GoogleApiUrls, NotionClient};
use metrics_exporter_prometheus::PrometheusHandle;
use settings::{MemoryStore, Settings, SettingsStore, SupabaseStore};

use crate::config::{Config, TokenStorage};
use crate::cookies::{CREDENTIAL_MAX_AGE, CookiePolicy};
use crate::credentials::{Credentials, Storage};

/// Upper bound on waiting for in-flight requests after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);
/// How often idle sessions are dropped from the session store.
const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    settings: Arc<Settings>,
    oauth: Arc<OAuthClient>,
    accessor: Arc<TokenAccessor>,
    credentials: Arc<Credentials>,
    google: GoogleApi,
    notion: NotionClient,
    started_at: Instant,
    prometheus: PrometheusHandle,
}

/// Build the axum router with all routes and shared state.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(routes::api())
        .layer(axum::middleware::from_fn(metrics::track))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting splash-banana");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle = metrics::install_recorder();

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let settings_backend = if config.settings.supabase_url.is_some() {
        "supabase"
    } else {
        "env"
    };
    info!(
        listen_addr = %config.server.listen_addr,
        public_url = %config.server.public_url,
        settings_backend,
        token_storage = ?config.auth.token_storage,
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.server.upstream_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let store: Arc<dyn SettingsStore> = match &config.settings.supabase_url {
        Some(url) => {
            let key = config
                .settings
                .service_role_key
                .clone()
                .context("SUPABASE_SERVICE_ROLE_KEY missing")?;
            Arc::new(SupabaseStore::new(
                http.clone(),
                url,
                &config.settings.table,
                key,
            ))
        }
        None => {
            warn!("no settings backend configured, resolving settings from environment only");
            Arc::new(MemoryStore::default())
        }
    };
    let settings = Arc::new(
        Settings::new(store).with_ttl(Duration::from_secs(config.settings.ttl_secs)),
    );

    let oauth = Arc::new(OAuthClient::new(
        http.clone(),
        settings.clone(),
        Endpoints::default(),
        &config.server.public_url,
    ));
    if !oauth.is_configured().await {
        warn!("google client id/secret not resolvable yet, consent flow will fail until set");
    }
    let accessor =
        Arc::new(TokenAccessor::new(oauth.clone()).with_refresh_hook(metrics::record_refresh));

    let storage = match config.auth.token_storage {
        TokenStorage::Cookie => Storage::Cookie,
        TokenStorage::Session => {
            let key = config
                .auth
                .encryption_key
                .as_ref()
                .context("TOKEN_ENCRYPTION_KEY missing")?;
            let sealer = Sealer::from_base64(key.expose())
                .context("TOKEN_ENCRYPTION_KEY must be a base64-encoded 32-byte key")?;
            let sessions = SessionStore::load(config.auth.sessions_path.clone(), sealer)
                .await
                .with_context(|| {
                    format!(
                        "failed to load sessions from {}",
                        config.auth.sessions_path.display()
                    )
                })?;
            let pruned = sessions
                .prune(CREDENTIAL_MAX_AGE.as_millis() as u64)
                .await
                .context("failed to prune expired sessions")?;
            info!(pruned, sessions = sessions.len().await, "session store ready");
            let sessions = Arc::new(sessions);
            google_auth::spawn_prune_task(
                sessions.clone(),
                SESSION_PRUNE_INTERVAL,
                CREDENTIAL_MAX_AGE,
            );
            Storage::Session(sessions)
        }
    };
    let credentials = Arc::new(Credentials::new(
        storage,
        CookiePolicy {
            secure: config.auth.secure_cookies,
        },
        config.auth.persist_refreshed,
    ));

    let app_state = AppState {
        settings,
        oauth,
        accessor,
        credentials,
        google: GoogleApi::new(http.clone(), GoogleApiUrls::default()),
        notion: NotionClient::new(http, integrations::notion::DEFAULT_BASE_URL),
        started_at: Instant::now(),
        prometheus: prometheus_handle,
    };

    let app = build_router(app_state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timeout starts when the shutdown signal fires, not when the
    // server starts.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// Liveness plus a summary of how credentials are wired.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "token_storage": state.credentials.mode(),
        "google_configured": state.oauth.is_configured().await,
    }))
}

/// Prometheus metrics endpoint in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn health_reports_storage_and_configuration() {
        let response = get(TestState::new().router(), "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["token_storage"], "cookie");
        assert_eq!(json["google_configured"], true);
        assert!(json["uptime_seconds"].is_u64());
    }

    #[tokio::test]
    async fn health_flags_missing_google_client() {
        let router = TestState::new().rows(vec![]).router();
        let json = body_json(get(router, "/health", None).await).await;
        assert_eq!(json["google_configured"], false);
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_prometheus_format() {
        let response = get(TestState::new().router(), "/metrics", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.contains("text/plain"));
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = get(TestState::new().router(), "/health", None).await;
        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(id.starts_with("req_"));
        assert_eq!(id.len(), 4 + 32);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = get(TestState::new().router(), "/api/unknown", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
