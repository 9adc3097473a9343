//! Storage Adapters
//!
//! Implementations of the CertificateRepository port.
//!
//! ## Available Adapters
//!
//! - **FileCertificateRepository** - One `<serial>.pem` file per certificate
//! - **InMemoryCertificateRepository** - Snapshot kept in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileCertificateRepository, InMemoryCertificateRepository};
//!
//! // Production: survives restarts without a network bootstrap
//! let repository = FileCertificateRepository::new("./data/platform-certs");
//!
//! // Testing
//! let repository = InMemoryCertificateRepository::new();
//! ```

mod file_certificate_repository;
mod in_memory_certificate_repository;

pub use file_certificate_repository::FileCertificateRepository;
pub use in_memory_certificate_repository::InMemoryCertificateRepository;
