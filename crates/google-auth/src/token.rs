//! Authorization code exchange and token refresh
//!
//! Both operations POST a form to the token endpoint with different grant
//! types. Neither retries: a failure goes straight back to the caller.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bundle::CredentialBundle;
use crate::client::OAuthClient;
use crate::error::{Error, Result};

/// Response from the token endpoint for both exchange and refresh.
///
/// `expires_in` is a delta in seconds from the response time. Refresh
/// responses normally omit `refresh_token`.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires (delta, not absolute)
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry for a response received at `issued_at_ms`.
    pub fn expires_at(&self, issued_at_ms: u64) -> u64 {
        issued_at_ms.saturating_add(self.expires_in.saturating_mul(1000))
    }

    /// Bundle for a fresh consent grant.
    pub fn into_bundle(self, issued_at_ms: u64) -> CredentialBundle {
        let expires_at = self.expires_at(issued_at_ms);
        CredentialBundle {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }

    /// Apply a refresh response to an existing bundle, keeping the old
    /// refresh token unless Google rotated it.
    pub fn refreshed(self, previous: &CredentialBundle, issued_at_ms: u64) -> CredentialBundle {
        let expires_at = self.expires_at(issued_at_ms);
        CredentialBundle {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or_else(|| previous.refresh_token.clone()),
            expires_at,
        }
    }
}

impl OAuthClient {
    /// Exchange an authorization code from the callback for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let client_id = self.client_id().await?;
        let client_secret = self.client_secret().await?;
        let redirect_uri = self.redirect_uri().await;

        let response = self
            .http
            .post(&self.endpoints.token)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            warn!(status = status.as_u16(), "authorization code exchange rejected");
            return Err(Error::Exchange {
                status: status.as_u16(),
                body,
            });
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::InvalidResponse(format!("exchange: {e}")))?;
        debug!(
            has_refresh_token = token.refresh_token.is_some(),
            expires_in = token.expires_in,
            "authorization code exchanged"
        );
        Ok(token)
    }

    /// Get a new access token using a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let client_id = self.client_id().await?;
        let client_secret = self.client_secret().await?;

        let response = self
            .http
            .post(&self.endpoints.token)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));

            if is_invalid_grant(&body) {
                return Err(Error::Revoked(format!("token endpoint returned {status}: {body}")));
            }

            return Err(Error::Refresh {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::InvalidResponse(format!("refresh: {e}")))
    }
}

/// Google signals a dead refresh token with `{"error":"invalid_grant"}`.
fn is_invalid_grant(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(|e| e == "invalid_grant"))
        .unwrap_or(false)
}
