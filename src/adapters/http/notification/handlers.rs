//! HTTP handler for platform notifications.
//!
//! Hands the raw headers and body bytes to the `NotificationProcessor` and
//! renders its reply. The body is never re-serialized before verification.
//! A delivery signed under a serial the store does not know triggers one
//! certificate refresh and a single retry before it is rejected.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use crate::application::CertificateDownloader;
use crate::domain::notification::{NotificationError, NotificationHandler, NotificationProcessor};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the notification endpoint.
#[derive(Clone)]
pub struct NotificationAppState {
    pub processor: Arc<NotificationProcessor>,
    pub handler: Arc<dyn NotificationHandler>,
    /// Must share its store with the processor's verifier.
    pub downloader: Arc<CertificateDownloader>,
}

impl NotificationAppState {
    pub fn new(
        processor: Arc<NotificationProcessor>,
        handler: Arc<dyn NotificationHandler>,
        downloader: Arc<CertificateDownloader>,
    ) -> Self {
        Self {
            processor,
            handler,
            downloader,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /notifications/wechatpay - Receive a platform notification
pub async fn receive_notification(
    State(state): State<NotificationAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let received = match state.processor.receive(&headers, &body) {
        Err(NotificationError::UnknownCertificate(serial)) => {
            tracing::info!(serial = %serial, "Unknown platform serial, refreshing certificates");
            match state.downloader.refresh().await {
                Ok(_) => state.processor.receive(&headers, &body),
                Err(e) => {
                    tracing::warn!(error = %e, "Certificate refresh failed");
                    Err(NotificationError::UnknownCertificate(serial))
                }
            }
        }
        other => other,
    };

    let reply = state.processor.respond(received, state.handler.as_ref());

    (reply.status, Json(reply.body))
}
