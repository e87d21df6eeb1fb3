//! Shared-secret auth tokens for privileged calls (upload, delete).
//!
//! A token is `base64(nonce || AES-256-GCM(json payload))`. The nonce is
//! derived from the key and the plaintext, so one identity always produces
//! the same token.

use crate::models::TokenPayload;
use crate::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine as _;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct TokenBuilder {
    key: Option<[u8; 32]>,
}

impl std::fmt::Debug for TokenBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBuilder")
            .field("key", &self.key.map(|_| "<redacted>"))
            .finish()
    }
}

impl TokenBuilder {
    pub fn new(sec_key: Option<&str>) -> Self {
        Self {
            key: sec_key.map(|k| Sha256::digest(k.as_bytes()).into()),
        }
    }

    /// Build the token for an identity, or `None` when `pid` is blank.
    pub fn build(&self, pid: &str, srv_id: &str, srv_pwd: &str) -> Result<Option<String>> {
        if pid.trim().is_empty() {
            return Ok(None);
        }

        let payload = TokenPayload {
            pid: pid.to_string(),
            srv_id: srv_id.to_string(),
            srv_pwd: srv_pwd.to_string(),
        };
        let data = serde_json::to_vec(&payload)?;

        self.seal(&data).map(Some)
    }

    /// Decrypt a token back into the identity it carries.
    pub fn open(&self, token: &str) -> Result<TokenPayload> {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(token)
            .map_err(|e| Error::Token(format!("Token is not base64: {}", e)))?;

        if raw.len() <= NONCE_LEN {
            return Err(Error::Token("Token is too short".to_string()));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);

        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| Error::Token(format!("Decryption failed: {}", e)))?;

        Ok(serde_json::from_slice(&plaintext)?)
    }

    fn seal(&self, data: &[u8]) -> Result<String> {
        let key = self.key_bytes()?;

        let mut hasher = Sha256::new();
        hasher.update(key);
        hasher.update(data);
        let digest = hasher.finalize();
        let nonce_bytes = &digest[..NONCE_LEN];

        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(nonce_bytes), data)
            .map_err(|e| Error::Token(format!("Encryption failed: {}", e)))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(sealed))
    }

    fn key_bytes(&self) -> Result<&[u8; 32]> {
        self.key
            .as_ref()
            .ok_or_else(|| Error::Token("No token encryption key configured".to_string()))
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(self.key_bytes()?)
            .map_err(|e| Error::Token(format!("Invalid key: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_pid_yields_no_token() {
        let builder = TokenBuilder::new(Some("shared"));

        assert_eq!(builder.build("", "IDPS001", "pwd").unwrap(), None);
        assert_eq!(builder.build("   ", "IDPS001", "pwd").unwrap(), None);
        // Blank pid wins even without a key.
        assert_eq!(TokenBuilder::new(None).build("", "x", "y").unwrap(), None);
    }

    #[test]
    fn test_token_is_deterministic() {
        let builder = TokenBuilder::new(Some("shared"));

        let first = builder.build("p1", "IDPS001", "pwd").unwrap().unwrap();
        let second = builder.build("p1", "IDPS001", "pwd").unwrap().unwrap();
        assert_eq!(first, second);

        let other = builder.build("p2", "IDPS001", "pwd").unwrap().unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_token_opens_to_payload() {
        let builder = TokenBuilder::new(Some("shared"));
        let token = builder.build("p1", "IDPS001", "pwd").unwrap().unwrap();

        let payload = builder.open(&token).unwrap();
        assert_eq!(
            payload,
            TokenPayload {
                pid: "p1".to_string(),
                srv_id: "IDPS001".to_string(),
                srv_pwd: "pwd".to_string(),
            }
        );
    }

    #[test]
    fn test_wrong_key_cannot_open() {
        let token = TokenBuilder::new(Some("shared"))
            .build("p1", "IDPS001", "pwd")
            .unwrap()
            .unwrap();

        let err = TokenBuilder::new(Some("other")).open(&token).unwrap_err();
        assert!(matches!(err, Error::Token(_)));
    }

    #[test]
    fn test_pid_without_key_is_error() {
        let err = TokenBuilder::new(None).build("p1", "s", "pw").unwrap_err();
        assert!(matches!(err, Error::Token(_)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let builder = TokenBuilder::new(Some("shared"));

        assert!(matches!(builder.open("!!!"), Err(Error::Token(_))));
        assert!(matches!(builder.open("AAAA"), Err(Error::Token(_))));
    }
}
