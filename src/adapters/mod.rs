//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum endpoint receiving platform notifications
//! - `storage` - Certificate snapshot persistence (file, in-memory)
//! - `wechatpay` - Signed reqwest transport and business endpoints

pub mod http;
pub mod storage;
pub mod wechatpay;

pub use storage::{FileCertificateRepository, InMemoryCertificateRepository};
pub use wechatpay::{PaymentClient, ReqwestTransport};
