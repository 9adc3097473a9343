//! Shared key and certificate fixtures for unit tests.

use std::sync::Arc;

use once_cell::sync::Lazy;
use rsa::RsaPrivateKey;

use super::certificate::PlatformCertificate;
use super::merchant::{parse_private_key, MerchantIdentity};

pub const MERCHANT_KEY_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/merchant_key.pem"));
pub const PLATFORM_KEY_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/platform_key.pem"));
pub const PLATFORM_CERT_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/platform_cert.pem"));
pub const PLATFORM_CERT_NEXT_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/platform_cert_next.pem"));
pub const EXPIRED_CERT_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/expired_cert.pem"));
pub const UNTRUSTED_CERT_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/untrusted_cert.pem"));

pub const PLATFORM_SERIAL: &str = "5F3A6C2B9D10E4F7A1B2C3D4E5F60718";
pub const PLATFORM_NEXT_SERIAL: &str = "3C8E1A2B4D5F60718293A4B5C6D7E8F9";
pub const EXPIRED_SERIAL: &str = "1A2B3C4D5E6F708192A3B4C5D6E7F801";
pub const UNTRUSTED_SERIAL: &str = "2B3C4D5E6F708192A3B4C5D6E7F80112";

pub const TRUSTED_ROOT: &str = "Tenpay.com Root CA";
pub const TEST_API_V3_KEY: &str = "0123456789abcdefghijklmnopqrstuv";

static MERCHANT_KEY: Lazy<RsaPrivateKey> =
    Lazy::new(|| parse_private_key(MERCHANT_KEY_PEM).expect("merchant fixture key"));
static PLATFORM_KEY: Lazy<RsaPrivateKey> =
    Lazy::new(|| parse_private_key(PLATFORM_KEY_PEM).expect("platform fixture key"));

pub fn merchant_private_key() -> RsaPrivateKey {
    MERCHANT_KEY.clone()
}

pub fn platform_private_key() -> RsaPrivateKey {
    PLATFORM_KEY.clone()
}

pub fn test_identity() -> Arc<MerchantIdentity> {
    Arc::new(
        MerchantIdentity::new(
            "1900000001",
            "MCHSERIAL0001",
            merchant_private_key(),
            TEST_API_V3_KEY,
        )
        .expect("test identity"),
    )
}

pub fn platform_certificate() -> PlatformCertificate {
    PlatformCertificate::from_pem(PLATFORM_CERT_PEM.as_bytes()).expect("platform fixture cert")
}
