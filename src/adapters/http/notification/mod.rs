//! HTTP adapter for platform notifications.
//!
//! - `POST /notifications/wechatpay` - Verified, decrypted, dispatched webhook

mod handlers;
mod routes;

pub use handlers::{receive_notification, NotificationAppState};
pub use routes::{notification_router, NOTIFICATION_PATH};
