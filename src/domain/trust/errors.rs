//! Error types for the trust subsystem.
//!
//! Expected verification outcomes (a signature that simply does not match) are
//! NOT errors; they surface as `false` from the verifier. These variants cover
//! configuration, certificate, transport and storage failures.

use thiserror::Error;

/// Errors raised by signing, verification, decryption and certificate rotation.
#[derive(Debug, Clone, Error)]
pub enum TrustError {
    /// Merchant identity material is missing or unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A downloaded or persisted certificate is malformed or untrusted.
    #[error("Certificate invalid: {0}")]
    CertificateInvalid(String),

    /// The certificate bundle response could not be verified.
    #[error("Download verification failed: {0}")]
    DownloadVerificationFailed(String),

    /// No trusted certificate is known for the given serial number.
    #[error("Unknown certificate: {0}")]
    UnknownCertificate(String),

    /// A platform signature did not verify.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// AEAD decryption failed (bad tag, key, nonce or encoding).
    #[error("Decrypt error: {0}")]
    Decrypt(String),

    /// The HTTP collaborator failed or timed out.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Persisting or loading the certificate snapshot failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TrustError {
    /// Returns true if repeating the same operation may succeed.
    ///
    /// Only transport failures qualify. Signature and decrypt failures point at
    /// tampering or a stale certificate and must surface to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrustError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_certificate_displays_serial() {
        let err = TrustError::UnknownCertificate("5F3A".to_string());
        assert_eq!(format!("{}", err), "Unknown certificate: 5F3A");
    }

    #[test]
    fn signature_invalid_displays_correctly() {
        assert_eq!(format!("{}", TrustError::SignatureInvalid), "Invalid signature");
    }

    #[test]
    fn transport_error_is_retryable() {
        assert!(TrustError::Transport("timeout".to_string()).is_retryable());
    }

    #[test]
    fn verification_failures_are_not_retryable() {
        assert!(!TrustError::SignatureInvalid.is_retryable());
        assert!(!TrustError::Decrypt("tag".to_string()).is_retryable());
        assert!(!TrustError::DownloadVerificationFailed("x".to_string()).is_retryable());
        assert!(!TrustError::UnknownCertificate("x".to_string()).is_retryable());
    }
}
