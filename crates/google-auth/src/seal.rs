//! AES-256-GCM sealing for credential bundles stored server-side
//!
//! Sealed form is `base64(nonce || ciphertext)` with a fresh 96-bit nonce per
//! seal. Opening fails on a wrong key or any tampering.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::bundle::CredentialBundle;
use crate::error::{Error, Result};

/// Key size in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

const NONCE_SIZE: usize = 12;

pub struct Sealer {
    cipher: Aes256Gcm,
}

impl Sealer {
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_SIZE {
            return Err(Error::Crypto(format!(
                "key must be {KEY_SIZE} bytes, got {}",
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| Error::Crypto(format!("invalid key: {e}")))?;
        Ok(Self { cipher })
    }

    /// Build from a base64-encoded 32-byte key (the `TOKEN_ENCRYPTION_KEY` format).
    pub fn from_base64(key: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(key.trim())
            .map_err(|e| Error::Crypto(format!("key is not valid base64: {e}")))?;
        Self::new(&bytes)
    }

    pub fn seal(&self, bundle: &CredentialBundle) -> Result<String> {
        let plaintext = serde_json::to_vec(bundle)
            .map_err(|e| Error::Crypto(format!("serializing bundle: {e}")))?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|e| Error::Crypto(format!("encryption failed: {e}")))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    pub fn open(&self, sealed: &str) -> Result<CredentialBundle> {
        let bytes = STANDARD
            .decode(sealed)
            .map_err(|e| Error::Crypto(format!("sealed value is not base64: {e}")))?;
        if bytes.len() < NONCE_SIZE {
            return Err(Error::Crypto("sealed value is too short".into()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Crypto("decryption failed (wrong key or tampered data)".into()))?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| Error::Crypto(format!("sealed payload is not a bundle: {e}")))
    }
}

impl fmt::Debug for Sealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sealer([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> CredentialBundle {
        CredentialBundle {
            access_token: "ya29.sealed".into(),
            refresh_token: Some("1//sealed".into()),
            expires_at: 1_767_225_600_000,
        }
    }

    #[test]
    fn open_inverts_seal() {
        let sealer = Sealer::new(&[0xAB; KEY_SIZE]).unwrap();
        let sealed = sealer.seal(&bundle()).unwrap();
        assert!(!sealed.contains("ya29"), "sealed form must not leak the token");
        assert_eq!(sealer.open(&sealed).unwrap(), bundle());
    }

    #[test]
    fn nonces_differ_between_seals() {
        let sealer = Sealer::new(&[1; KEY_SIZE]).unwrap();
        assert_ne!(sealer.seal(&bundle()).unwrap(), sealer.seal(&bundle()).unwrap());
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = Sealer::new(&[1; KEY_SIZE]).unwrap().seal(&bundle()).unwrap();
        let err = Sealer::new(&[2; KEY_SIZE]).unwrap().open(&sealed).unwrap_err();
        assert!(matches!(err, Error::Crypto(_)));
    }

    #[test]
    fn tampering_is_detected() {
        let sealer = Sealer::new(&[7; KEY_SIZE]).unwrap();
        let mut bytes = STANDARD.decode(sealer.seal(&bundle()).unwrap()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(sealer.open(&STANDARD.encode(bytes)).is_err());
        assert!(sealer.open("c2hvcnQ=").is_err());
    }

    #[test]
    fn key_length_is_validated() {
        let err = Sealer::new(&[0; 31]).unwrap_err();
        assert!(err.to_string().contains("32 bytes"), "got: {err}");
        assert!(Sealer::from_base64("not base64!").is_err());
        assert!(Sealer::from_base64(&STANDARD.encode([9u8; KEY_SIZE])).is_ok());
    }
}
