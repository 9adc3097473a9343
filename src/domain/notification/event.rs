//! Notification wire body and the normalised event handed to handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::trust::EncryptedResource;

/// The only event type that carries a payment result to decrypt.
pub const TRANSACTION_SUCCESS: &str = "TRANSACTION.SUCCESS";

/// Notification body as delivered by the platform.
///
/// Fields are read leniently: a missing, null or non-string value becomes
/// empty. `resource` is kept as raw JSON and only interpreted for
/// `TRANSACTION.SUCCESS`, so other event types may carry any shape.
#[derive(Debug, Clone, Default)]
pub struct NotificationBody {
    pub id: String,
    pub create_time: Option<String>,
    pub event_type: String,
    pub resource_type: Option<String>,
    pub summary: String,
    pub resource: Option<Value>,
}

impl NotificationBody {
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            id: text("id").unwrap_or_default(),
            create_time: text("create_time"),
            event_type: text("event_type").unwrap_or_default(),
            resource_type: text("resource_type"),
            summary: text("summary").unwrap_or_default(),
            resource: object.get("resource").filter(|v| !v.is_null()).cloned(),
        }
    }

    pub fn is_transaction_success(&self) -> bool {
        self.event_type == TRANSACTION_SUCCESS
    }

    /// Interprets `resource` as the encrypted envelope.
    ///
    /// `None` when the body has no resource.
    pub fn encrypted_resource(&self) -> Option<Result<EncryptedResource, serde_json::Error>> {
        self.resource.as_ref().map(EncryptedResource::deserialize)
    }
}

/// Outcome marker carried by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationResult {
    Success,
    Fail,
}

/// A verified, parsed notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationEvent {
    pub id: String,
    pub create_time: Option<DateTime<Utc>>,
    pub event_type: String,
    pub summary: String,
    pub decrypted_payload: Option<Value>,
    pub result: NotificationResult,
}

impl NotificationEvent {
    pub(crate) fn from_body(body: &NotificationBody) -> Self {
        Self {
            id: body.id.clone(),
            create_time: body.create_time.as_deref().and_then(parse_rfc3339),
            event_type: body.event_type.clone(),
            summary: body.summary.clone(),
            decrypted_payload: None,
            result: NotificationResult::Fail,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == NotificationResult::Success
    }

    /// `success_time` from the decrypted transaction, if present.
    pub fn success_time(&self) -> Option<DateTime<Utc>> {
        self.decrypted_payload
            .as_ref()?
            .get("success_time")?
            .as_str()
            .and_then(parse_rfc3339)
    }

    /// Convenience accessor for a string field of the decrypted payload.
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.decrypted_payload.as_ref()?.get(field)?.as_str()
    }
}

/// Parses platform timestamps such as `2018-06-08T10:34:56+08:00`.
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
