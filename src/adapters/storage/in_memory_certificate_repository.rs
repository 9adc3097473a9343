//! In-Memory Certificate Repository Adapter
//!
//! Keeps the persisted snapshot in memory. Useful for testing and for
//! deployments that accept a network bootstrap on every start.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{CertificateRepository, RepositoryError, StoredCertificate};

/// In-memory certificate snapshot
#[derive(Debug, Clone, Default)]
pub struct InMemoryCertificateRepository {
    entries: Arc<RwLock<Vec<StoredCertificate>>>,
    saves: Arc<RwLock<usize>>,
}

impl InMemoryCertificateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed `save_all` calls (useful for tests)
    pub async fn save_count(&self) -> usize {
        *self.saves.read().await
    }
}

#[async_trait]
impl CertificateRepository for InMemoryCertificateRepository {
    async fn load_all(&self) -> Result<Vec<StoredCertificate>, RepositoryError> {
        Ok(self.entries.read().await.clone())
    }

    async fn save_all(&self, certificates: &[StoredCertificate]) -> Result<(), RepositoryError> {
        *self.entries.write().await = certificates.to_vec();
        *self.saves.write().await += 1;
        Ok(())
    }
}
