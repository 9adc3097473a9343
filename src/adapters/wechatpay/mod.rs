//! WeChat Pay platform adapter.
//!
//! Implements the `PlatformTransport` port over reqwest and exposes the
//! business endpoints as validated, verified passthroughs.
//!
//! # Configuration
//!
//! ```ignore
//! let signer = Signer::new(identity.clone());
//! let transport = ReqwestTransport::new(DEFAULT_API_BASE_URL, signer, Duration::from_secs(10))?;
//! ```

pub mod api;
mod payment_client;
mod request_validator;
mod reqwest_transport;

pub use api::DEFAULT_API_BASE_URL;
pub use payment_client::{
    ApiResponse, PartnerContext, PaymentClient, TRANSPORT_FAILURE_CODE, UNVERIFIED_RESPONSE_CODE,
};
pub use request_validator::{
    check_bill, check_identifier, check_query, check_refund, check_refund_query, check_unified,
    RequestValidationError,
};
pub use reqwest_transport::ReqwestTransport;
