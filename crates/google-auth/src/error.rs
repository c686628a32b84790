//! Error types for Google OAuth operations

/// Errors from OAuth and credential storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed ({status}): {body}")]
    Exchange { status: u16, body: String },

    #[error("token refresh failed ({status}): {body}")]
    Refresh { status: u16, body: String },

    /// Google answered `invalid_grant`: consent revoked or refresh token expired.
    #[error("refresh token revoked: {0}")]
    Revoked(String),

    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    #[error("malformed credential cookie: {0}")]
    MalformedCookie(String),

    #[error("setting {0} is not configured")]
    MissingSetting(&'static str),

    #[error("encryption error: {0}")]
    Crypto(String),

    #[error("session file parse error: {0}")]
    SessionParse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Short label for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Http(_) => "http",
            Error::Exchange { .. } => "exchange",
            Error::Refresh { .. } => "refresh",
            Error::Revoked(_) => "revoked",
            Error::InvalidResponse(_) => "invalid_response",
            Error::MalformedCookie(_) => "malformed_cookie",
            Error::MissingSetting(_) => "missing_setting",
            Error::Crypto(_) => "crypto",
            Error::SessionParse(_) => "session_parse",
            Error::Io(_) => "io",
            Error::NotFound(_) => "not_found",
        }
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_error_carries_body() {
        let err = Error::Exchange {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.into(),
        };
        assert_eq!(
            err.to_string(),
            r#"token exchange failed (400): {"error":"invalid_grant"}"#
        );
        assert_eq!(err.kind(), "exchange");
    }

    #[test]
    fn missing_setting_names_key() {
        let err = Error::MissingSetting("google_client_id");
        assert_eq!(err.to_string(), "setting google_client_id is not configured");
    }
}
