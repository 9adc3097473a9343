//! Merchant identity - the integration's own signing and decryption material.

use std::fmt;
use std::path::Path;

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use secrecy::{ExposeSecret, SecretString};

use super::codec::KEY_SIZE;
use super::errors::TrustError;

/// Immutable identity of the calling merchant.
///
/// Passed by reference (usually behind an `Arc`) into every component that
/// signs or decrypts. Never persisted by this crate.
pub struct MerchantIdentity {
    merchant_id: String,
    certificate_serial_number: String,
    private_key: RsaPrivateKey,
    api_v3_key: SecretString,
}

impl MerchantIdentity {
    /// Builds an identity from already-loaded key material.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Configuration` if any identifier is empty or the
    /// API v3 key is not exactly 32 bytes.
    pub fn new(
        merchant_id: impl Into<String>,
        certificate_serial_number: impl Into<String>,
        private_key: RsaPrivateKey,
        api_v3_key: impl Into<String>,
    ) -> Result<Self, TrustError> {
        let merchant_id = merchant_id.into();
        let certificate_serial_number = certificate_serial_number.into();
        let api_v3_key = api_v3_key.into();

        if merchant_id.trim().is_empty() {
            return Err(TrustError::Configuration("merchant id is empty".to_string()));
        }
        if certificate_serial_number.trim().is_empty() {
            return Err(TrustError::Configuration(
                "merchant certificate serial number is empty".to_string(),
            ));
        }
        if api_v3_key.len() != KEY_SIZE {
            return Err(TrustError::Configuration(format!(
                "API v3 key must be {} bytes, got {}",
                KEY_SIZE,
                api_v3_key.len()
            )));
        }

        Ok(Self {
            merchant_id,
            certificate_serial_number,
            private_key,
            api_v3_key: SecretString::new(api_v3_key),
        })
    }

    /// Builds an identity, parsing the private key from PEM text.
    pub fn from_pem(
        merchant_id: impl Into<String>,
        certificate_serial_number: impl Into<String>,
        private_key_pem: &str,
        api_v3_key: impl Into<String>,
    ) -> Result<Self, TrustError> {
        let private_key = parse_private_key(private_key_pem)?;
        Self::new(merchant_id, certificate_serial_number, private_key, api_v3_key)
    }

    /// Builds an identity, reading the private key PEM from disk.
    pub fn from_key_file(
        merchant_id: impl Into<String>,
        certificate_serial_number: impl Into<String>,
        private_key_path: impl AsRef<Path>,
        api_v3_key: impl Into<String>,
    ) -> Result<Self, TrustError> {
        let path = private_key_path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|e| {
            TrustError::Configuration(format!(
                "cannot read private key {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_pem(merchant_id, certificate_serial_number, &pem, api_v3_key)
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn certificate_serial_number(&self) -> &str {
        &self.certificate_serial_number
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// The 32-byte AES key used for certificate and notification resources.
    pub fn symmetric_key(&self) -> &[u8] {
        self.api_v3_key.expose_secret().as_bytes()
    }
}

impl fmt::Debug for MerchantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantIdentity")
            .field("merchant_id", &self.merchant_id)
            .field("certificate_serial_number", &self.certificate_serial_number)
            .field("private_key", &"[REDACTED]")
            .field("api_v3_key", &"[REDACTED]")
            .finish()
    }
}

/// Parses an RSA private key in PKCS#8 or PKCS#1 PEM form.
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, TrustError> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| TrustError::Configuration(format!("invalid private key: {e}")))
}
