//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `CertificateRepository` - Durable snapshot of trusted platform certificates
//! - `PlatformTransport` - Signed HTTP calls to the payment platform

mod certificate_repository;
mod platform_transport;

pub use certificate_repository::{CertificateRepository, RepositoryError, StoredCertificate};
pub use platform_transport::{
    HttpMethod, PlatformRequest, PlatformResponse, PlatformTransport, TransportError,
};
