//! WeChat Pay API v3 trust subsystem.
//!
//! Signs outbound requests and payment parameters with the merchant key,
//! keeps the platform certificate set current through verified rotation,
//! and authenticates and decrypts inbound notifications.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
