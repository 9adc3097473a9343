//! Shared fixtures and test doubles for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rsa::RsaPrivateKey;

use wechatpay_trust::application::{CertificateDownloader, RefreshPolicy};
use wechatpay_trust::domain::trust::{
    codec, parse_private_key, platform_message, CertificateStore, MerchantIdentity,
};
use wechatpay_trust::ports::{
    CertificateRepository, PlatformRequest, PlatformResponse, PlatformTransport, TransportError,
};

// =============================================================================
// Fixtures
// =============================================================================

pub const MERCHANT_KEY_PEM: &str = include_str!("../fixtures/merchant_key.pem");
pub const PLATFORM_KEY_PEM: &str = include_str!("../fixtures/platform_key.pem");
pub const PLATFORM_KEY_NEXT_PEM: &str = include_str!("../fixtures/platform_key_next.pem");
pub const PLATFORM_CERT_PEM: &str = include_str!("../fixtures/platform_cert.pem");
pub const PLATFORM_CERT_NEXT_PEM: &str = include_str!("../fixtures/platform_cert_next.pem");
pub const EXPIRED_CERT_PEM: &str = include_str!("../fixtures/expired_cert.pem");
pub const UNTRUSTED_CERT_PEM: &str = include_str!("../fixtures/untrusted_cert.pem");

pub const PLATFORM_SERIAL: &str = "5F3A6C2B9D10E4F7A1B2C3D4E5F60718";
pub const PLATFORM_NEXT_SERIAL: &str = "3C8E1A2B4D5F60718293A4B5C6D7E8F9";
pub const EXPIRED_SERIAL: &str = "1A2B3C4D5E6F708192A3B4C5D6E7F801";
pub const UNTRUSTED_SERIAL: &str = "2B3C4D5E6F708192A3B4C5D6E7F80112";

pub const MERCHANT_ID: &str = "1900000001";
pub const MERCHANT_SERIAL: &str = "MCHSERIAL0001";
pub const API_V3_KEY: &str = "0123456789abcdefghijklmnopqrstuv";

pub const TIMESTAMP: &str = "1700000000";

static MERCHANT_KEY: Lazy<RsaPrivateKey> =
    Lazy::new(|| parse_private_key(MERCHANT_KEY_PEM).expect("merchant fixture key"));
static PLATFORM_KEY: Lazy<RsaPrivateKey> =
    Lazy::new(|| parse_private_key(PLATFORM_KEY_PEM).expect("platform fixture key"));
static PLATFORM_KEY_NEXT: Lazy<RsaPrivateKey> =
    Lazy::new(|| parse_private_key(PLATFORM_KEY_NEXT_PEM).expect("next platform fixture key"));

pub fn platform_key() -> &'static RsaPrivateKey {
    &PLATFORM_KEY
}

pub fn platform_key_next() -> &'static RsaPrivateKey {
    &PLATFORM_KEY_NEXT
}

pub fn identity() -> Arc<MerchantIdentity> {
    Arc::new(
        MerchantIdentity::new(MERCHANT_ID, MERCHANT_SERIAL, MERCHANT_KEY.clone(), API_V3_KEY)
            .expect("test identity"),
    )
}

// =============================================================================
// Platform-side helpers
// =============================================================================

/// Signs `body` the way the platform does for responses and notifications.
pub fn platform_signature(key: &RsaPrivateKey, nonce: &str, body: &str) -> String {
    codec::sign(key, &platform_message(TIMESTAMP, nonce, body.as_bytes())).expect("sign")
}

/// Wechatpay-* verification headers, lower-case like the transport returns them.
pub fn signature_headers(serial: &str, nonce: &str, signature: String) -> HashMap<String, String> {
    HashMap::from([
        ("wechatpay-serial".to_string(), serial.to_string()),
        ("wechatpay-timestamp".to_string(), TIMESTAMP.to_string()),
        ("wechatpay-nonce".to_string(), nonce.to_string()),
        ("wechatpay-signature".to_string(), signature),
    ])
}

/// A signed platform response.
pub fn signed_response(status: u16, body: String, serial: &str, key: &RsaPrivateKey) -> PlatformResponse {
    let signature = platform_signature(key, "response-nonce", &body);
    PlatformResponse {
        status,
        headers: signature_headers(serial, "response-nonce", signature),
        body,
    }
}

/// `/v3/certificates` body with each PEM encrypted under the API v3 key.
pub fn bundle_body(entries: &[(&str, &str)]) -> String {
    let data: Vec<_> = entries
        .iter()
        .map(|(serial, pem)| {
            let resource =
                codec::encrypt_resource(API_V3_KEY.as_bytes(), "c0ffee123456", "certificate", pem.as_bytes())
                    .expect("encrypt certificate");
            serde_json::json!({
                "serial_no": serial,
                "effective_time": "2020-01-01T00:00:00+08:00",
                "expire_time": "2099-01-01T00:00:00+08:00",
                "encrypt_certificate": resource,
            })
        })
        .collect();
    serde_json::json!({ "data": data }).to_string()
}

/// Bundle response signed by `serial`/`key`.
pub fn bundle_response(entries: &[(&str, &str)], serial: &str, key: &RsaPrivateKey) -> PlatformResponse {
    signed_response(200, bundle_body(entries), serial, key)
}

// =============================================================================
// Test doubles
// =============================================================================

/// Replays queued responses in order, recording every request.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<PlatformResponse, TransportError>>>,
    requests: Mutex<Vec<PlatformRequest>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<PlatformResponse, TransportError>>) -> Arc<Self> {
        Self::with_delay(responses, Duration::ZERO)
    }

    pub fn with_delay(
        responses: Vec<Result<PlatformResponse, TransportError>>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn push(&self, response: Result<PlatformResponse, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PlatformRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformTransport for ScriptedTransport {
    async fn execute(&self, request: PlatformRequest) -> Result<PlatformResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connection("script exhausted".into())))
    }
}

pub fn fast_policy() -> RefreshPolicy {
    RefreshPolicy {
        initial_backoff: Duration::from_millis(1),
        ..RefreshPolicy::default()
    }
}

pub fn downloader(
    transport: Arc<ScriptedTransport>,
    repository: Arc<dyn CertificateRepository>,
) -> Arc<CertificateDownloader> {
    Arc::new(CertificateDownloader::new(
        identity(),
        Arc::new(CertificateStore::new()),
        transport,
        repository,
        fast_policy(),
    ))
}
