//! File-based Certificate Repository Adapter
//!
//! Stores each platform certificate as `<serial>.pem` in one directory.
//! Entries are written to a temp file and renamed into place. Certificates
//! from the previous snapshot are removed only after the new set, and the
//! directory entries naming it, have been synced to disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::ports::{CertificateRepository, RepositoryError, StoredCertificate};

const PEM_EXTENSION: &str = "pem";
const TEMP_SUFFIX: &str = ".tmp";

/// Directory of PEM files keyed by serial number.
#[derive(Debug, Clone)]
pub struct FileCertificateRepository {
    base_path: PathBuf,
}

impl FileCertificateRepository {
    /// Create a repository rooted at `base_path`. The directory is created on
    /// first save.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn entry_path(&self, serial_number: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.{}", serial_number, PEM_EXTENSION))
    }

    fn temp_path(&self, serial_number: &str) -> PathBuf {
        self.base_path
            .join(format!(".{}.{}{}", serial_number, PEM_EXTENSION, TEMP_SUFFIX))
    }

    /// Writes `entry` to a temp file and renames it into place. A failed
    /// write never leaves the temp file behind.
    async fn write_atomically(&self, entry: &StoredCertificate) -> Result<(), RepositoryError> {
        let temp = self.temp_path(&entry.serial_number);

        let written = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(&entry.pem).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp, self.entry_path(&entry.serial_number)).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %temp.display(), error = %cleanup, "Failed to remove temp file");
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Makes the renames durable before anything is pruned.
    #[cfg(unix)]
    async fn sync_directory(&self) -> Result<(), RepositoryError> {
        fs::File::open(&self.base_path).await?.sync_all().await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn sync_directory(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    /// Serials become file names, so only hex-like characters are allowed.
    fn validate_serial(serial_number: &str) -> Result<(), RepositoryError> {
        if serial_number.is_empty() || !serial_number.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RepositoryError::InvalidName(serial_number.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CertificateRepository for FileCertificateRepository {
    async fn load_all(&self) -> Result<Vec<StoredCertificate>, RepositoryError> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut certificates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PEM_EXTENSION) {
                continue;
            }
            let Some(serial_number) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if serial_number.starts_with('.') {
                continue;
            }

            let pem = fs::read(&path).await?;
            certificates.push(StoredCertificate {
                serial_number: serial_number.to_string(),
                pem,
            });
        }

        Ok(certificates)
    }

    async fn save_all(&self, certificates: &[StoredCertificate]) -> Result<(), RepositoryError> {
        for entry in certificates {
            Self::validate_serial(&entry.serial_number)?;
        }

        fs::create_dir_all(&self.base_path).await?;

        for entry in certificates {
            self.write_atomically(entry).await?;
        }
        self.sync_directory().await?;

        let keep: HashSet<PathBuf> = certificates
            .iter()
            .map(|c| self.entry_path(&c.serial_number))
            .collect();

        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_pem = path.extension().and_then(|e| e.to_str()) == Some(PEM_EXTENSION);
            if is_pem && !keep.contains(&path) {
                tracing::debug!(path = %path.display(), "Removing stale certificate file");
                fs::remove_file(&path).await?;
            }
        }

        Ok(())
    }
}
