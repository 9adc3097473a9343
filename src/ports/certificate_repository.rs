//! Certificate Repository Port - durable snapshot of trusted platform certificates.
//!
//! The downloader writes the full surviving set after each successful
//! rotation and reads it back at startup so a restart needs no network call.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::trust::PlatformCertificate;

/// Errors from certificate persistence.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid entry name: {0}")]
    InvalidName(String),
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::Io(err.to_string())
    }
}

/// A persisted certificate: serial number plus the PEM bytes as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCertificate {
    pub serial_number: String,
    pub pem: Vec<u8>,
}

impl From<&PlatformCertificate> for StoredCertificate {
    fn from(cert: &PlatformCertificate) -> Self {
        Self {
            serial_number: cert.serial_number().to_string(),
            pem: cert.raw().to_vec(),
        }
    }
}

/// Port for the persisted certificate snapshot.
///
/// # Contract
///
/// - `save_all` replaces the whole snapshot. Readers never observe a
///   truncated entry, and entries from the previous snapshot are removed
///   only after every new entry is durable.
/// - `load_all` returns every entry, in no particular order.
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    async fn load_all(&self) -> Result<Vec<StoredCertificate>, RepositoryError>;

    async fn save_all(&self, certificates: &[StoredCertificate]) -> Result<(), RepositoryError>;
}
