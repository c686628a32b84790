//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Secrets (`SUPABASE_SERVICE_ROLE_KEY`, `TOKEN_ENCRYPTION_KEY`) are read
//! from the environment only, never from the TOML.

use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const SUPABASE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const ENCRYPTION_KEY_ENV: &str = "TOKEN_ENCRYPTION_KEY";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Externally visible origin, used to derive the OAuth callback URL.
    pub public_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,
}

/// Backing table for the settings resolver
#[derive(Debug, Deserialize)]
pub struct SettingsConfig {
    /// Supabase project URL. Without it the resolver runs on env vars only.
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    #[serde(skip)]
    pub service_role_key: Option<Secret<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// Bundle lives in the browser as base64 JSON.
    Cookie,
    /// Bundle is sealed server-side; the browser only holds a session id.
    #[default]
    Session,
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token_storage: TokenStorage,
    #[serde(default = "default_sessions_path")]
    pub sessions_path: PathBuf,
    /// Write refreshed bundles back to the cookie or session.
    #[serde(default = "default_true")]
    pub persist_refreshed: bool,
    /// Mark cookies `Secure`. Only disable for plain-http local development.
    #[serde(default = "default_true")]
    pub secure_cookies: bool,
    #[serde(skip)]
    pub encryption_key: Option<Secret<String>>,
}

fn default_max_connections() -> usize {
    1000
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_table() -> String {
    "settings".to_string()
}

fn default_ttl() -> u64 {
    settings::DEFAULT_TTL.as_secs()
}

fn default_sessions_path() -> PathBuf {
    PathBuf::from("splash-banana-sessions.json")
}

fn default_true() -> bool {
    true
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            table: default_table(),
            ttl_secs: default_ttl(),
            service_role_key: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_storage: TokenStorage::default(),
            sessions_path: default_sessions_path(),
            persist_refreshed: true,
            secure_cookies: true,
            encryption_key: None,
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn secret_from_env(name: &str) -> Option<Secret<String>> {
    std::env::var(name).ok().and_then(Secret::non_empty)
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !is_http_url(&config.server.public_url) {
            return Err(common::Error::Config(format!(
                "public_url must start with http:// or https://, got: {}",
                config.server.public_url
            )));
        }

        if config.server.upstream_timeout_secs == 0 {
            return Err(common::Error::Config(
                "upstream_timeout_secs must be greater than 0".into(),
            ));
        }

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if config.settings.ttl_secs == 0 {
            return Err(common::Error::Config(
                "settings.ttl_secs must be greater than 0".into(),
            ));
        }

        if let Some(url) = &config.settings.supabase_url {
            if !is_http_url(url) {
                return Err(common::Error::Config(format!(
                    "supabase_url must start with http:// or https://, got: {url}"
                )));
            }
            config.settings.service_role_key = secret_from_env(SUPABASE_KEY_ENV);
            if config.settings.service_role_key.is_none() {
                return Err(common::Error::Env {
                    name: SUPABASE_KEY_ENV.into(),
                    reason: "required when settings.supabase_url is set".into(),
                });
            }
        }

        config.auth.encryption_key = secret_from_env(ENCRYPTION_KEY_ENV);
        if config.auth.token_storage == TokenStorage::Session
            && config.auth.encryption_key.is_none()
        {
            return Err(common::Error::Env {
                name: ENCRYPTION_KEY_ENV.into(),
                reason: "required when auth.token_storage = \"session\"".into(),
            });
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("splash-banana.toml")
    }
}
