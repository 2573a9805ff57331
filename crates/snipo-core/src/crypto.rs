//! At-rest encryption for the stored GitHub token.
//!
//! Tokens are sealed with ChaCha20-Poly1305 under a key derived from the
//! installation secret (`SHA-256(secret)`). The stored form is
//! `base64(nonce || ciphertext)`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const NONCE_LEN: usize = 12;

/// Symmetric cipher for credentials persisted in the sync config row
#[derive(Clone)]
pub struct CredentialCipher {
    cipher: ChaCha20Poly1305,
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CredentialCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl CredentialCipher {
    /// Derive the cipher from an installation secret
    pub fn from_secret(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(Error::Crypto("Secret key must not be empty".to_string()));
        }

        let digest = Sha256::digest(secret.as_bytes());
        let key = Key::from_slice(digest.as_slice());
        Ok(Self {
            cipher: ChaCha20Poly1305::new(key),
        })
    }

    /// Encrypt a plaintext token into its storable form
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| Error::Crypto("Failed to encrypt credential".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(nonce.as_slice());
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    /// Decrypt a stored token. Fails on tampering or a different secret.
    pub fn decrypt(&self, sealed: &str) -> Result<String> {
        let bytes = STANDARD
            .decode(sealed.trim())
            .map_err(|error| Error::Crypto(format!("Stored credential is not base64: {error}")))?;

        if bytes.len() <= NONCE_LEN {
            return Err(Error::Crypto("Stored credential is truncated".to_string()));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Crypto("Failed to decrypt credential".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::Crypto("Decrypted credential is not UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = CredentialCipher::from_secret("installation-secret").unwrap();
        let sealed = cipher.encrypt("ghp_token").unwrap();

        assert!(!sealed.contains("ghp_token"));
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "ghp_token");
    }

    #[test]
    fn test_nonce_is_random() {
        let cipher = CredentialCipher::from_secret("installation-secret").unwrap();
        assert_ne!(
            cipher.encrypt("ghp_token").unwrap(),
            cipher.encrypt("ghp_token").unwrap()
        );
    }

    #[test]
    fn test_wrong_secret_fails() {
        let sealed = CredentialCipher::from_secret("one")
            .unwrap()
            .encrypt("ghp_token")
            .unwrap();
        let other = CredentialCipher::from_secret("two").unwrap();

        assert!(matches!(other.decrypt(&sealed), Err(Error::Crypto(_))));
    }

    #[test]
    fn test_garbage_input_fails() {
        let cipher = CredentialCipher::from_secret("secret").unwrap();
        assert!(cipher.decrypt("not base64!").is_err());
        assert!(cipher.decrypt(&STANDARD.encode([0_u8; 4])).is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(CredentialCipher::from_secret("   ").is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let cipher = CredentialCipher::from_secret("secret").unwrap();
        assert!(format!("{cipher:?}").contains("[REDACTED]"));
    }
}
