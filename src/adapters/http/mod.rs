//! HTTP adapters - inbound endpoints.

pub mod notification;

pub use notification::{notification_router, NotificationAppState, NOTIFICATION_PATH};
