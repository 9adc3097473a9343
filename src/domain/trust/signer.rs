//! Signer - canonical signing strings for outbound requests and payment
//! parameters, signed with the merchant private key.

use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::codec;
use super::errors::TrustError;
use super::merchant::MerchantIdentity;

/// Authorization scheme for signed API requests.
pub const AUTHORIZATION_SCHEME: &str = "WECHATPAY2-SHA256-RSA2048";

/// Length of the random nonce included in every signed message.
pub const NONCE_LENGTH: usize = 32;

/// The output of one signing call.
///
/// `timestamp` and `nonce` are the exact values that went into
/// `canonical_string`; callers echo them into headers or payment fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub canonical_string: String,
    pub signature: String,
    pub serial_number_used: String,
    pub timestamp: i64,
    pub nonce: String,
}

/// Builds a canonical string: every line terminated by `\n`.
pub fn canonical_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    lines.into_iter().fold(String::new(), |mut acc, line| {
        acc.push_str(line);
        acc.push('\n');
        acc
    })
}

/// Generates a fresh 32-character alphanumeric nonce.
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// Signs on behalf of one merchant identity. Stateless per call.
#[derive(Debug, Clone)]
pub struct Signer {
    identity: Arc<MerchantIdentity>,
}

impl Signer {
    pub fn new(identity: Arc<MerchantIdentity>) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &MerchantIdentity {
        &self.identity
    }

    /// Signs `app_id\ntimestamp\nnonce\npayload_reference\n`.
    ///
    /// `payload_reference` is call specific, e.g. `prepay_id=wx201410272009395522657a690389285100`.
    pub fn sign_payment(
        &self,
        app_id: &str,
        payload_reference: &str,
    ) -> Result<SignedMessage, TrustError> {
        let timestamp = Utc::now().timestamp();
        let nonce = generate_nonce();
        self.sign_payment_with(app_id, payload_reference, timestamp, nonce)
    }

    fn sign_payment_with(
        &self,
        app_id: &str,
        payload_reference: &str,
        timestamp: i64,
        nonce: String,
    ) -> Result<SignedMessage, TrustError> {
        let ts = timestamp.to_string();
        let canonical = canonical_lines([app_id, ts.as_str(), nonce.as_str(), payload_reference]);
        self.finish(canonical, timestamp, nonce)
    }

    /// Signs `METHOD\npath_and_query\ntimestamp\nnonce\nbody\n` for an API call.
    ///
    /// `body` is empty for GET requests.
    pub fn sign_request(
        &self,
        method: &str,
        path_and_query: &str,
        body: &str,
    ) -> Result<SignedMessage, TrustError> {
        let timestamp = Utc::now().timestamp();
        let nonce = generate_nonce();
        let ts = timestamp.to_string();
        let method = method.to_ascii_uppercase();
        let canonical = canonical_lines([
            method.as_str(),
            path_and_query,
            ts.as_str(),
            nonce.as_str(),
            body,
        ]);
        self.finish(canonical, timestamp, nonce)
    }

    /// Renders the `Authorization` header value for a request signature.
    pub fn authorization_header(&self, signed: &SignedMessage) -> String {
        format!(
            "{} mchid=\"{}\",nonce_str=\"{}\",signature=\"{}\",timestamp=\"{}\",serial_no=\"{}\"",
            AUTHORIZATION_SCHEME,
            self.identity.merchant_id(),
            signed.nonce,
            signed.signature,
            signed.timestamp,
            signed.serial_number_used,
        )
    }

    fn finish(
        &self,
        canonical_string: String,
        timestamp: i64,
        nonce: String,
    ) -> Result<SignedMessage, TrustError> {
        let signature = codec::sign(self.identity.private_key(), canonical_string.as_bytes())?;
        Ok(SignedMessage {
            canonical_string,
            signature,
            serial_number_used: self.identity.certificate_serial_number().to_string(),
            timestamp,
            nonce,
        })
    }
}

/// Parameters handed to the JSAPI front end to invoke payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsApiParams {
    pub app_id: String,
    pub time_stamp: String,
    pub nonce_str: String,
    pub package: String,
    pub sign_type: String,
    pub pay_sign: String,
}

impl JsApiParams {
    pub fn from_signed(app_id: &str, package: &str, signed: &SignedMessage) -> Self {
        Self {
            app_id: app_id.to_string(),
            time_stamp: signed.timestamp.to_string(),
            nonce_str: signed.nonce.clone(),
            package: package.to_string(),
            sign_type: "RSA".to_string(),
            pay_sign: signed.signature.clone(),
        }
    }
}
