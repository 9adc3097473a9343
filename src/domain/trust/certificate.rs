//! Platform certificate - a parsed, admitted platform public-key certificate.

use chrono::{DateTime, Utc};
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use x509_parser::prelude::*;

use super::errors::TrustError;

/// Issuer common name every platform certificate must carry.
pub const TRUSTED_ROOT_COMMON_NAME: &str = "Tenpay.com Root CA";

/// A platform certificate admitted into the trust store.
///
/// Never mutated after construction. Rotation replaces whole entries.
#[derive(Debug, Clone)]
pub struct PlatformCertificate {
    serial_number: String,
    issuer_common_name: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    public_key: RsaPublicKey,
    raw: Vec<u8>,
}

impl PlatformCertificate {
    /// Parses a PEM-encoded X.509 certificate with an RSA public key.
    ///
    /// The serial number is rendered as upper-case hex, the form the platform
    /// uses in `Wechatpay-Serial` headers.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::CertificateInvalid` for bad PEM, bad DER, a
    /// missing issuer CN, or a non-RSA key.
    pub fn from_pem(raw: &[u8]) -> Result<Self, TrustError> {
        let pem = ::pem::parse(raw)
            .map_err(|e| TrustError::CertificateInvalid(format!("Failed to parse PEM: {e}")))?;

        let (_, x509) = X509Certificate::from_der(pem.contents()).map_err(|e| {
            TrustError::CertificateInvalid(format!("Failed to parse X.509: {e:?}"))
        })?;

        let serial_number = hex::encode_upper(x509.raw_serial());

        let issuer_common_name = x509
            .issuer()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(str::to_string)
            .ok_or_else(|| TrustError::CertificateInvalid("Issuer has no common name".to_string()))?;

        let not_before = DateTime::from_timestamp(x509.validity().not_before.timestamp(), 0)
            .ok_or_else(|| TrustError::CertificateInvalid("Invalid notBefore".to_string()))?;
        let not_after = DateTime::from_timestamp(x509.validity().not_after.timestamp(), 0)
            .ok_or_else(|| TrustError::CertificateInvalid("Invalid notAfter".to_string()))?;

        let public_key = RsaPublicKey::from_public_key_der(x509.public_key().raw).map_err(|e| {
            TrustError::CertificateInvalid(format!("Certificate key is not RSA: {e}"))
        })?;

        Ok(Self {
            serial_number,
            issuer_common_name,
            not_before,
            not_after,
            public_key,
            raw: raw.to_vec(),
        })
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn issuer_common_name(&self) -> &str {
        &self.issuer_common_name
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// The PEM bytes this certificate was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Active means `not_after` is strictly in the future.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.not_after > now
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Checks the admission rules: trusted issuer CN and not expired.
    pub fn check_admissible(&self, trusted_root: &str, now: DateTime<Utc>) -> Result<(), TrustError> {
        if self.issuer_common_name != trusted_root {
            return Err(TrustError::CertificateInvalid(format!(
                "untrusted issuer '{}' for certificate {}",
                self.issuer_common_name, self.serial_number
            )));
        }
        if !self.is_active_at(now) {
            return Err(TrustError::CertificateInvalid(format!(
                "certificate {} expired at {}",
                self.serial_number, self.not_after
            )));
        }
        Ok(())
    }
}
