//! Verifier - checks platform signatures on responses and notifications.

use std::sync::Arc;

use super::certificate_store::{CertificateSnapshot, CertificateStore};
use super::codec;
use super::errors::TrustError;

/// Builds the platform's signed message: `timestamp\nnonce\nbody\n`.
///
/// The body is used byte for byte as received.
pub fn platform_message(timestamp: &str, nonce: &str, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(timestamp.len() + nonce.len() + body.len() + 3);
    message.extend_from_slice(timestamp.as_bytes());
    message.push(b'\n');
    message.extend_from_slice(nonce.as_bytes());
    message.push(b'\n');
    message.extend_from_slice(body);
    message.push(b'\n');
    message
}

/// Verifies platform-originated signatures against the trusted store.
#[derive(Debug, Clone)]
pub struct Verifier {
    store: Arc<CertificateStore>,
}

impl Verifier {
    pub fn new(store: Arc<CertificateStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<CertificateStore> {
        &self.store
    }

    /// Verifies `signature` over `timestamp\nnonce\nbody\n` with the
    /// certificate named by `serial_number`.
    ///
    /// Returns `Ok(false)` for a signature that does not match.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::UnknownCertificate` if the serial is not trusted.
    /// Callers may refresh certificates and retry on that error.
    pub fn verify(
        &self,
        serial_number: &str,
        timestamp: &str,
        nonce: &str,
        body: &[u8],
        signature: &str,
    ) -> Result<bool, TrustError> {
        Self::verify_in(&self.store.snapshot(), serial_number, timestamp, nonce, body, signature)
    }

    /// Same as [`Verifier::verify`] but against an explicit certificate set.
    ///
    /// Used to check a certificate download against candidates that are not
    /// yet admitted into the store.
    pub fn verify_in(
        certificates: &CertificateSnapshot,
        serial_number: &str,
        timestamp: &str,
        nonce: &str,
        body: &[u8],
        signature: &str,
    ) -> Result<bool, TrustError> {
        let certificate = certificates
            .get(serial_number)
            .ok_or_else(|| TrustError::UnknownCertificate(serial_number.to_string()))?;

        let message = platform_message(timestamp, nonce, body);
        let valid = codec::verify(certificate.public_key(), &message, signature);

        if !valid {
            tracing::debug!(serial_no = %serial_number, "Platform signature mismatch");
        }
        Ok(valid)
    }
}
