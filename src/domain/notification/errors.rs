//! Notification error types.
//!
//! Every variant is a terminal rejection of one webhook delivery, with the
//! HTTP status code that tells the platform whether to deliver again.

use axum::http::StatusCode;
use thiserror::Error;

use super::processor::NotificationStage;

/// Errors that reject an inbound notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// One or more `Wechatpay-*` verification headers were absent or empty.
    #[error("Missing verification headers: {0}")]
    MissingVerificationHeaders(String),

    /// The serial in `Wechatpay-Serial` is not in the trusted set.
    #[error("Unknown certificate: {0}")]
    UnknownCertificate(String),

    /// The platform signature did not match the raw body.
    #[error("Invalid signature")]
    SignatureInvalid,

    /// Body was empty or not a JSON object.
    #[error("Empty or malformed body: {0}")]
    EmptyOrMalformedBody(String),

    /// The encrypted resource could not be decrypted.
    #[error("Decrypt error: {0}")]
    Decrypt(String),
}

impl NotificationError {
    /// The state the processor failed to reach.
    pub fn rejected_at(&self) -> NotificationStage {
        match self {
            NotificationError::MissingVerificationHeaders(_) => NotificationStage::HeadersValidated,
            NotificationError::UnknownCertificate(_) | NotificationError::SignatureInvalid => {
                NotificationStage::SignatureVerified
            }
            NotificationError::EmptyOrMalformedBody(_) => NotificationStage::BodyParsed,
            NotificationError::Decrypt(_) => NotificationStage::ResourceDecrypted,
        }
    }

    /// Maps the error to the HTTP status returned to the platform.
    ///
    /// 5xx asks the platform to redeliver, which helps when the failure is a
    /// certificate rotation this process has not picked up yet.
    pub fn status_code(&self) -> StatusCode {
        match self {
            NotificationError::SignatureInvalid => StatusCode::UNAUTHORIZED,

            NotificationError::MissingVerificationHeaders(_)
            | NotificationError::EmptyOrMalformedBody(_) => StatusCode::BAD_REQUEST,

            NotificationError::UnknownCertificate(_) | NotificationError::Decrypt(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
