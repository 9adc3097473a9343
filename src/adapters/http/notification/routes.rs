//! Axum router configuration for the notification endpoint.

use axum::{routing::post, Router};

use super::handlers::{receive_notification, NotificationAppState};

/// Path the platform is configured to deliver notifications to.
pub const NOTIFICATION_PATH: &str = "/notifications/wechatpay";

/// Create the notification router.
///
/// # Routes
/// - `POST /notifications/wechatpay` - Platform webhook (no auth, signature verified)
pub fn notification_router() -> Router<NotificationAppState> {
    Router::new().route(NOTIFICATION_PATH, post(receive_notification))
}
