//! The credential bundle issued at consent and replaced on refresh

use serde::{Deserialize, Serialize};

/// A user's Google credentials.
///
/// `expires_at` is a unix timestamp in milliseconds (absolute, not a delta),
/// computed from `expires_in` at the moment the token endpoint answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    /// Bearer token for Google API calls (~1 hour)
    pub access_token: String,
    /// Only present after a consent grant with `access_type=offline`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiration as unix timestamp in milliseconds
    pub expires_at: u64,
}

impl CredentialBundle {
    /// Whether the access token is still usable `buffer_ms` from `now_ms`.
    pub fn is_fresh(&self, now_ms: u64, buffer_ms: u64) -> bool {
        self.expires_at > now_ms.saturating_add(buffer_ms)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Current unix time in milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(expires_at: u64, refresh: Option<&str>) -> CredentialBundle {
        CredentialBundle {
            access_token: "ya29.a0".into(),
            refresh_token: refresh.map(String::from),
            expires_at,
        }
    }

    #[test]
    fn freshness_respects_buffer() {
        let b = bundle(1_000_000, None);
        assert!(b.is_fresh(0, 999_999));
        assert!(!b.is_fresh(0, 1_000_000), "expiry exactly at the buffer edge is stale");
        assert!(!b.is_fresh(u64::MAX, 1), "must not overflow");
    }

    #[test]
    fn empty_refresh_token_cannot_refresh() {
        assert!(bundle(0, Some("1//0g")).can_refresh());
        assert!(!bundle(0, Some("")).can_refresh());
        assert!(!bundle(0, None).can_refresh());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let json = serde_json::to_value(bundle(42, Some("rt"))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"access_token": "ya29.a0", "refresh_token": "rt", "expires_at": 42})
        );
        let no_refresh = serde_json::to_value(bundle(42, None)).unwrap();
        assert!(no_refresh.get("refresh_token").is_none());
    }
}
