//! Certificate store - the currently trusted platform certificate set.
//!
//! The set lives behind a single `Arc` that is swapped under a short write
//! lock. Readers clone the `Arc` and then work on an immutable snapshot, so a
//! lookup never sees a mix of the old and new sets.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use super::certificate::PlatformCertificate;
use super::errors::TrustError;

/// Immutable view of the trusted set at one point in time.
#[derive(Debug, Default)]
pub struct CertificateSnapshot {
    by_serial: HashMap<String, Arc<PlatformCertificate>>,
}

impl CertificateSnapshot {
    pub fn new(certificates: impl IntoIterator<Item = PlatformCertificate>) -> Self {
        let by_serial = certificates
            .into_iter()
            .map(|cert| (cert.serial_number().to_string(), Arc::new(cert)))
            .collect();
        Self { by_serial }
    }

    pub fn get(&self, serial_number: &str) -> Option<Arc<PlatformCertificate>> {
        self.by_serial.get(serial_number).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_serial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_serial.is_empty()
    }

    pub fn serial_numbers(&self) -> Vec<String> {
        let mut serials: Vec<String> = self.by_serial.keys().cloned().collect();
        serials.sort();
        serials
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PlatformCertificate>> {
        self.by_serial.values()
    }
}

/// Shared, concurrently readable store of trusted platform certificates.
#[derive(Debug, Default)]
pub struct CertificateStore {
    current: RwLock<Arc<CertificateSnapshot>>,
}

impl CertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `certificates`.
    pub fn with_certificates(certificates: impl IntoIterator<Item = PlatformCertificate>) -> Self {
        Self {
            current: RwLock::new(Arc::new(CertificateSnapshot::new(certificates))),
        }
    }

    /// Returns the current snapshot. Holding it does not block replacement.
    pub fn snapshot(&self) -> Arc<CertificateSnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Looks up a certificate by serial number.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::UnknownCertificate` if no such serial is trusted.
    pub fn get(&self, serial_number: &str) -> Result<Arc<PlatformCertificate>, TrustError> {
        self.snapshot()
            .get(serial_number)
            .ok_or_else(|| TrustError::UnknownCertificate(serial_number.to_string()))
    }

    /// Atomically replaces the whole trusted set.
    pub fn replace_all(&self, certificates: impl IntoIterator<Item = PlatformCertificate>) {
        let next = Arc::new(CertificateSnapshot::new(certificates));
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Certificates whose `not_after` is strictly after `now`.
    pub fn list_active_at(&self, now: DateTime<Utc>) -> Vec<Arc<PlatformCertificate>> {
        let mut active: Vec<Arc<PlatformCertificate>> = self
            .snapshot()
            .iter()
            .filter(|cert| cert.is_active_at(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| a.serial_number().cmp(b.serial_number()));
        active
    }

    pub fn list_active(&self) -> Vec<Arc<PlatformCertificate>> {
        self.list_active_at(Utc::now())
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }
}
