//! Cookie codec for the credential bundle
//!
//! `base64(json(bundle))`. This is plain encoding: anyone holding the cookie
//! can read and alter the tokens. Deployments that need confidentiality use
//! the sealed `SessionStore` instead.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::bundle::CredentialBundle;
use crate::error::{Error, Result};

/// Encode a bundle into an opaque cookie value.
pub fn encode(bundle: &CredentialBundle) -> String {
    // Serializing a struct of strings and integers cannot fail
    let json = serde_json::to_vec(bundle).unwrap_or_default();
    STANDARD.encode(json)
}

/// Decode a cookie value. Malformed input yields `None`.
pub fn decode(value: &str) -> Option<CredentialBundle> {
    match try_decode(value) {
        Ok(bundle) => Some(bundle),
        Err(e) => {
            debug!(error = %e, "ignoring malformed credential cookie");
            None
        }
    }
}

/// Decode a cookie value, reporting why it was rejected.
pub fn try_decode(value: &str) -> Result<CredentialBundle> {
    let bytes = STANDARD
        .decode(value.trim())
        .map_err(|e| Error::MalformedCookie(format!("base64: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::MalformedCookie(format!("json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CredentialBundle {
        CredentialBundle {
            access_token: "ya29.a0AfH6SMB".into(),
            refresh_token: Some("1//0gLx-refresh".into()),
            expires_at: 4_102_444_800_000,
        }
    }

    #[test]
    fn decode_inverts_encode() {
        let bundle = sample();
        assert_eq!(decode(&encode(&bundle)), Some(bundle));

        let without_refresh = CredentialBundle {
            refresh_token: None,
            ..sample()
        };
        assert_eq!(decode(&encode(&without_refresh)), Some(without_refresh));
    }

    #[test]
    fn encoded_value_is_base64_json() {
        let encoded = encode(&sample());
        let json = STANDARD.decode(&encoded).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["access_token"], "ya29.a0AfH6SMB");
        assert_eq!(value["expires_at"], 4_102_444_800_000u64);
    }

    #[test]
    fn malformed_values_decode_to_none() {
        let not_json = STANDARD.encode("definitely not json");
        let wrong_shape = STANDARD.encode(r#"{"access_token":42}"#);
        let missing_field = STANDARD.encode(r#"{"access_token":"a"}"#);
        for input in [
            "",
            "%%%not-base64%%%",
            "e30",
            not_json.as_str(),
            wrong_shape.as_str(),
            missing_field.as_str(),
            "\u{1F34C}",
        ] {
            assert_eq!(decode(input), None, "input {input:?} must decode to None");
        }
    }

    #[test]
    fn try_decode_reports_stage() {
        let err = try_decode("!!!").unwrap_err();
        assert!(matches!(err, Error::MalformedCookie(ref m) if m.starts_with("base64")));

        let err = try_decode(&STANDARD.encode("[]")).unwrap_err();
        assert!(matches!(err, Error::MalformedCookie(ref m) if m.starts_with("json")));
    }
}
