//! OAuth client configuration resolved through the settings cache

use std::sync::Arc;

use settings::{SettingKey, Settings};

use crate::constants::{AUTHORIZE_ENDPOINT, CALLBACK_PATH, TOKEN_ENDPOINT};
use crate::error::{Error, Result};

/// Authorization and token endpoint URLs. Overridable for tests.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub authorize: String,
    pub token: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize: AUTHORIZE_ENDPOINT.to_string(),
            token: TOKEN_ENDPOINT.to_string(),
        }
    }
}

/// Google OAuth web client.
///
/// Client id, secret and redirect URI are looked up on every call so a
/// settings change takes effect after the cache TTL without a restart.
pub struct OAuthClient {
    pub(crate) http: reqwest::Client,
    pub(crate) settings: Arc<Settings>,
    pub(crate) endpoints: Endpoints,
    default_redirect_uri: String,
}

impl OAuthClient {
    /// `public_url` is the externally visible origin of the dashboard; the
    /// callback path is appended when no redirect URI setting exists.
    pub fn new(
        http: reqwest::Client,
        settings: Arc<Settings>,
        endpoints: Endpoints,
        public_url: &str,
    ) -> Self {
        Self {
            http,
            settings,
            endpoints,
            default_redirect_uri: format!("{}{}", public_url.trim_end_matches('/'), CALLBACK_PATH),
        }
    }

    pub(crate) async fn client_id(&self) -> Result<String> {
        self.require(SettingKey::GoogleClientId).await
    }

    pub(crate) async fn client_secret(&self) -> Result<String> {
        self.require(SettingKey::GoogleClientSecret).await
    }

    pub(crate) async fn redirect_uri(&self) -> String {
        self.settings
            .get(SettingKey::GoogleRedirectUri)
            .await
            .unwrap_or_else(|| self.default_redirect_uri.clone())
    }

    async fn require(&self, key: SettingKey) -> Result<String> {
        self.settings
            .get(key)
            .await
            .ok_or(Error::MissingSetting(key.as_str()))
    }

    /// Whether a client id and secret are resolvable.
    pub async fn is_configured(&self) -> bool {
        self.client_id().await.is_ok() && self.client_secret().await.is_ok()
    }
}
