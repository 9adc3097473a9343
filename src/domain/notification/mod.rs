//! Notification domain module.
//!
//! Inbound platform webhooks: signature headers, the verify-then-decrypt
//! state machine and the handler contract.
//!
//! # Module Structure
//!
//! - `headers` - `Wechatpay-*` signature headers
//! - `event` - Wire body and normalised `NotificationEvent`
//! - `processor` - `NotificationProcessor` state machine
//! - `errors` - Rejection reasons with HTTP status mapping

mod errors;
mod event;
mod headers;
mod processor;

pub use errors::NotificationError;
pub use event::{
    parse_rfc3339, NotificationBody, NotificationEvent, NotificationResult, TRANSACTION_SUCCESS,
};
pub use headers::{
    SignatureHeaders, HEADER_NONCE, HEADER_SERIAL, HEADER_SIGNATURE, HEADER_TIMESTAMP,
};
pub use processor::{
    AeadResourceDecryptor, HandlerOutcome, NotificationHandler, NotificationProcessor,
    NotificationReply, NotificationResponse, NotificationStage, ResourceDecryptor,
};
