//! Notification processor - verify, parse, decrypt, then dispatch one webhook.
//!
//! ## States
//!
//! `Received → HeadersValidated → SignatureVerified → BodyParsed →
//! [ResourceDecrypted] → Dispatched → Responded`
//!
//! Any failure before `Dispatched` is a terminal rejection. The signature is
//! checked over the raw bytes before the body is parsed, so a tampered body
//! never reaches decryption or the handler.

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::trust::{codec, EncryptedResource, MerchantIdentity, TrustError, Verifier};

use super::errors::NotificationError;
use super::event::{NotificationBody, NotificationEvent, NotificationResult};
use super::headers::SignatureHeaders;

/// Processing states of one inbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStage {
    Received,
    HeadersValidated,
    SignatureVerified,
    BodyParsed,
    ResourceDecrypted,
    Dispatched,
    Responded,
}

/// Decrypts notification resources.
pub trait ResourceDecryptor: Send + Sync {
    fn decrypt(&self, resource: &EncryptedResource) -> Result<String, TrustError>;
}

/// AES-256-GCM decryption with the merchant's API v3 key.
pub struct AeadResourceDecryptor {
    identity: Arc<MerchantIdentity>,
}

impl AeadResourceDecryptor {
    pub fn new(identity: Arc<MerchantIdentity>) -> Self {
        Self { identity }
    }
}

impl ResourceDecryptor for AeadResourceDecryptor {
    fn decrypt(&self, resource: &EncryptedResource) -> Result<String, TrustError> {
        codec::decrypt_resource(self.identity.symmetric_key(), resource)
    }
}

/// What the caller's handler decided about an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Acknowledge; the platform stops redelivering.
    Success(String),
    /// Reject; the platform will deliver again.
    Failure(String),
}

impl HandlerOutcome {
    pub fn success() -> Self {
        HandlerOutcome::Success(String::new())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        HandlerOutcome::Failure(message.into())
    }
}

/// Business handling of a verified notification.
///
/// Called exactly once per accepted delivery.
pub trait NotificationHandler: Send + Sync {
    fn handle(&self, event: &NotificationEvent) -> HandlerOutcome;
}

impl<F> NotificationHandler for F
where
    F: Fn(&NotificationEvent) -> HandlerOutcome + Send + Sync,
{
    fn handle(&self, event: &NotificationEvent) -> HandlerOutcome {
        self(event)
    }
}

/// Wire body returned to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub code: String,
    pub message: String,
}

impl NotificationResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            code: "SUCCESS".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: "ERROR".to_string(),
            message: message.into(),
        }
    }
}

/// Final status and body for one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationReply {
    pub status: StatusCode,
    pub body: NotificationResponse,
}

impl NotificationReply {
    fn rejected(error: &NotificationError) -> Self {
        Self {
            status: error.status_code(),
            body: NotificationResponse::error(error.to_string()),
        }
    }

    fn from_outcome(outcome: HandlerOutcome) -> Self {
        match outcome {
            HandlerOutcome::Success(message) => Self {
                status: StatusCode::OK,
                body: NotificationResponse::success(message),
            },
            HandlerOutcome::Failure(message) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: NotificationResponse::error(message),
            },
        }
    }
}

/// Runs the verify-then-decrypt state machine for inbound notifications.
pub struct NotificationProcessor {
    verifier: Verifier,
    decryptor: Arc<dyn ResourceDecryptor>,
}

impl fmt::Debug for NotificationProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationProcessor")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl NotificationProcessor {
    /// Creates a processor that decrypts with the identity's API v3 key.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::Configuration` if no platform certificate is
    /// trusted yet; nothing could ever be verified.
    pub fn new(identity: Arc<MerchantIdentity>, verifier: Verifier) -> Result<Self, TrustError> {
        Self::with_decryptor(verifier, Arc::new(AeadResourceDecryptor::new(identity)))
    }

    pub fn with_decryptor(
        verifier: Verifier,
        decryptor: Arc<dyn ResourceDecryptor>,
    ) -> Result<Self, TrustError> {
        if verifier.store().is_empty() {
            return Err(TrustError::Configuration(
                "no trusted platform certificate available".to_string(),
            ));
        }
        Ok(Self {
            verifier,
            decryptor,
        })
    }

    /// Runs the processor up to (not including) dispatch.
    pub fn receive(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<NotificationEvent, NotificationError> {
        let headers = SignatureHeaders::from_header_map(headers)?;
        self.advance(NotificationStage::HeadersValidated);

        self.verify_signature(&headers, body)?;
        self.advance(NotificationStage::SignatureVerified);

        let parsed = parse_body(body)?;
        self.advance(NotificationStage::BodyParsed);

        let mut event = NotificationEvent::from_body(&parsed);

        if !parsed.is_transaction_success() {
            return Ok(event);
        }

        let resource = match parsed.encrypted_resource() {
            Some(Ok(resource)) => resource,
            Some(Err(e)) => {
                return Err(NotificationError::Decrypt(format!("malformed resource: {e}")));
            }
            None => {
                tracing::warn!(event_id = %event.id, "Success notification without resource");
                return Ok(event);
            }
        };

        let plaintext = self
            .decryptor
            .decrypt(&resource)
            .map_err(|e| NotificationError::Decrypt(e.to_string()))?;
        let payload: Value = serde_json::from_str(&plaintext).map_err(|e| {
            NotificationError::Decrypt(format!("decrypted resource is not JSON: {e}"))
        })?;
        self.advance(NotificationStage::ResourceDecrypted);

        event.decrypted_payload = Some(payload);
        event.result = NotificationResult::Success;
        Ok(event)
    }

    /// Processes one delivery end to end and returns the reply for the platform.
    ///
    /// The handler runs only for verified, parsed events and its outcome is the
    /// last thing that shapes the reply.
    pub fn process(
        &self,
        headers: &HeaderMap,
        body: &[u8],
        handler: &dyn NotificationHandler,
    ) -> NotificationReply {
        self.respond(self.receive(headers, body), handler)
    }

    /// Turns the outcome of [`receive`](Self::receive) into the reply,
    /// dispatching to the handler only when the delivery was accepted.
    pub fn respond(
        &self,
        received: Result<NotificationEvent, NotificationError>,
        handler: &dyn NotificationHandler,
    ) -> NotificationReply {
        let event = match received {
            Ok(event) => event,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    stage = ?error.rejected_at(),
                    "Notification rejected"
                );
                return NotificationReply::rejected(&error);
            }
        };

        self.advance(NotificationStage::Dispatched);
        let outcome = handler.handle(&event);

        if let HandlerOutcome::Failure(ref message) = outcome {
            tracing::warn!(event_id = %event.id, message = %message, "Notification handler failed");
        } else {
            tracing::info!(
                event_id = %event.id,
                event_type = %event.event_type,
                result = ?event.result,
                "Notification acknowledged"
            );
        }

        self.advance(NotificationStage::Responded);
        NotificationReply::from_outcome(outcome)
    }

    fn verify_signature(
        &self,
        headers: &SignatureHeaders,
        body: &[u8],
    ) -> Result<(), NotificationError> {
        match self.verifier.verify(
            &headers.serial_number,
            &headers.timestamp,
            &headers.nonce,
            body,
            &headers.signature,
        ) {
            Ok(true) => Ok(()),
            Ok(false) => Err(NotificationError::SignatureInvalid),
            Err(TrustError::UnknownCertificate(serial)) => {
                Err(NotificationError::UnknownCertificate(serial))
            }
            Err(other) => {
                tracing::error!(error = %other, "Unexpected verifier failure");
                Err(NotificationError::SignatureInvalid)
            }
        }
    }

    fn advance(&self, stage: NotificationStage) {
        tracing::debug!(stage = ?stage, "Notification state");
    }
}

fn parse_body(body: &[u8]) -> Result<NotificationBody, NotificationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(NotificationError::EmptyOrMalformedBody("empty body".to_string()));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| NotificationError::EmptyOrMalformedBody(e.to_string()))?;

    match value.as_object() {
        Some(map) if !map.is_empty() => Ok(NotificationBody::from_object(map)),
        _ => Err(NotificationError::EmptyOrMalformedBody(
            "body is not a non-empty JSON object".to_string(),
        )),
    }
}
