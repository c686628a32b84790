//! Consent URL construction and CSRF state generation

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;

use crate::client::OAuthClient;
use crate::constants::SCOPES;
use crate::error::Result;

/// Generate an opaque random value for the `state` parameter or a session id.
///
/// 32 random bytes encoded as URL-safe base64 without padding (43 chars).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl OAuthClient {
    /// Build the Google consent URL.
    ///
    /// Always asks for offline access with forced consent so Google issues a
    /// refresh token even when the user authorized this client before.
    pub async fn authorization_url(&self, state: Option<&str>) -> Result<String> {
        let client_id = self.client_id().await?;
        let redirect_uri = self.redirect_uri().await;
        let scope = SCOPES.join(" ");

        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            self.endpoints.authorize,
            urlencoding::encode(&client_id),
            urlencoding::encode(&redirect_uri),
            urlencoding::encode(&scope),
        );
        if let Some(state) = state {
            url.push_str("&state=");
            url.push_str(&urlencoding::encode(state));
        }
        Ok(url)
    }
}
