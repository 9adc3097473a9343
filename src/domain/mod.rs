//! Domain layer containing the trust model and notification handling.
//!
//! # Module Organization
//!
//! - `trust` - Merchant identity, platform certificates, codec, signing and verification
//! - `notification` - Verified, decrypted inbound platform notifications

pub mod notification;
pub mod trust;
