//! CertificateDownloader - refreshes the trusted platform certificate set.
//!
//! ## Refresh protocol
//!
//! 1. GET `/v3/certificates`.
//! 2. Pre-check the response signature against the current store. With an
//!    empty store this is skipped (first-use bootstrap). A mismatch rejects
//!    the refresh; an unknown serial is deferred to step 5.
//! 3. Decrypt every entry with the API v3 key and parse it. Bad entries are
//!    logged and dropped.
//! 4. Drop entries with an untrusted issuer or past `not_after`.
//! 5. Verify the response signature against the admitted entries plus the
//!    current store. Failure rejects the whole refresh.
//! 6. Swap the admitted set into the store and persist it.
//!
//! Any failure before step 6 leaves the store untouched. Concurrent callers
//! share one in-flight refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::domain::notification::SignatureHeaders;
use crate::domain::trust::{
    codec, CertificateSnapshot, CertificateStore, EncryptedResource, MerchantIdentity,
    PlatformCertificate, TrustError, Verifier, TRUSTED_ROOT_COMMON_NAME,
};
use crate::ports::{
    CertificateRepository, PlatformRequest, PlatformResponse, PlatformTransport,
    StoredCertificate,
};

/// Path of the platform certificate bundle endpoint.
pub const CERTIFICATES_PATH: &str = "/v3/certificates";

/// Certificate bundle response body.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateBundle {
    pub data: Vec<BundleEntry>,
}

/// One encrypted certificate in the bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct BundleEntry {
    pub serial_no: String,
    #[serde(default)]
    pub effective_time: Option<String>,
    #[serde(default)]
    pub expire_time: Option<String>,
    pub encrypt_certificate: EncryptedResource,
}

/// Admission and retry settings for certificate refreshes.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// Issuer CN every admitted certificate must carry.
    pub trusted_root: String,
    /// Total attempts per refresh, counting the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each retry.
    pub initial_backoff: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            trusted_root: TRUSTED_ROOT_COMMON_NAME.to_string(),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Summary of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    /// Serial numbers now in the store, sorted.
    pub admitted: Vec<String>,
    /// Entries dropped for decrypt, parse or admission failures.
    pub discarded: usize,
    /// False when the swap succeeded but writing the snapshot did not.
    pub persisted: bool,
}

/// Keeps the certificate store in line with the platform's bundle.
pub struct CertificateDownloader {
    identity: Arc<MerchantIdentity>,
    store: Arc<CertificateStore>,
    transport: Arc<dyn PlatformTransport>,
    repository: Arc<dyn CertificateRepository>,
    policy: RefreshPolicy,
    in_flight: Mutex<Option<Result<RefreshReport, TrustError>>>,
    generation: AtomicU64,
}

impl CertificateDownloader {
    pub fn new(
        identity: Arc<MerchantIdentity>,
        store: Arc<CertificateStore>,
        transport: Arc<dyn PlatformTransport>,
        repository: Arc<dyn CertificateRepository>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            identity,
            store,
            transport,
            repository,
            policy,
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<CertificateStore> {
        &self.store
    }

    /// Number of refreshes that have run to completion (success or failure).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Populates the store from the persisted snapshot, falling back to a
    /// network refresh when nothing usable was persisted.
    pub async fn initialize(&self) -> Result<usize, TrustError> {
        let loaded = self.load_persisted().await?;
        if loaded > 0 {
            return Ok(loaded);
        }
        tracing::info!("No persisted platform certificates, bootstrapping from platform");
        let report = self.refresh().await?;
        Ok(report.admitted.len())
    }

    /// Loads the persisted snapshot into the store without a network call.
    ///
    /// Entries are re-parsed and re-checked; the store is only replaced when
    /// at least one survives. Returns the number admitted.
    pub async fn load_persisted(&self) -> Result<usize, TrustError> {
        let stored = self
            .repository
            .load_all()
            .await
            .map_err(|e| TrustError::Storage(e.to_string()))?;

        let now = Utc::now();
        let admitted: Vec<PlatformCertificate> = stored
            .iter()
            .filter_map(|entry| {
                let parsed = PlatformCertificate::from_pem(&entry.pem).and_then(|cert| {
                    cert.check_admissible(&self.policy.trusted_root, now)?;
                    Ok(cert)
                });
                match parsed {
                    Ok(cert) => Some(cert),
                    Err(e) => {
                        tracing::warn!(
                            serial_no = %entry.serial_number,
                            error = %e,
                            "Skipping persisted certificate"
                        );
                        None
                    }
                }
            })
            .collect();

        let count = admitted.len();
        if count > 0 {
            self.store.replace_all(admitted);
        }
        tracing::info!(count, "Loaded persisted platform certificates");
        Ok(count)
    }

    /// Refreshes the store from the platform.
    ///
    /// A caller that arrives while another refresh is running waits for it
    /// and returns its outcome instead of downloading again.
    pub async fn refresh(&self) -> Result<RefreshReport, TrustError> {
        let observed = self.generation.load(Ordering::SeqCst);
        let mut last = self.in_flight.lock().await;

        if self.generation.load(Ordering::SeqCst) != observed {
            if let Some(outcome) = last.as_ref() {
                tracing::debug!("Joining certificate refresh that completed while waiting");
                return outcome.clone();
            }
        }

        let outcome = self.refresh_with_retry().await;
        *last = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    async fn refresh_with_retry(&self) -> Result<RefreshReport, TrustError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.initial_backoff;
        let mut attempt = 1;

        loop {
            match self.refresh_once().await {
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "Certificate refresh failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "Certificate refresh failed");
                    return Err(e);
                }
                Ok(report) => return Ok(report),
            }
        }
    }

    async fn refresh_once(&self) -> Result<RefreshReport, TrustError> {
        tracing::info!("Refreshing platform certificates");

        let response = self
            .transport
            .execute(PlatformRequest::get(CERTIFICATES_PATH))
            .await
            .map_err(|e| TrustError::Transport(e.to_string()))?;
        check_status(&response)?;

        let headers = SignatureHeaders::from_map(&response.headers)
            .map_err(|e| TrustError::DownloadVerificationFailed(e.to_string()))?;
        let existing = self.store.snapshot();

        self.pre_check(&existing, &headers, &response)?;

        let bundle: CertificateBundle = serde_json::from_str(&response.body).map_err(|e| {
            TrustError::DownloadVerificationFailed(format!("malformed certificate bundle: {e}"))
        })?;

        let total = bundle.data.len();
        let now = Utc::now();
        let admitted: Vec<PlatformCertificate> = bundle
            .data
            .iter()
            .filter_map(|entry| match self.admit_entry(entry, now) {
                Ok(cert) => Some(cert),
                Err(e) => {
                    tracing::warn!(
                        serial_no = %entry.serial_no,
                        error = %e,
                        "Discarding certificate entry"
                    );
                    None
                }
            })
            .collect();

        if admitted.is_empty() {
            return Err(TrustError::DownloadVerificationFailed(
                "certificate bundle contained no admissible certificate".to_string(),
            ));
        }

        let candidates = union_with_existing(&admitted, &existing);
        match Verifier::verify_in(
            &candidates,
            &headers.serial_number,
            &headers.timestamp,
            &headers.nonce,
            response.body.as_bytes(),
            &headers.signature,
        ) {
            Ok(true) => {}
            Ok(false) => {
                return Err(TrustError::DownloadVerificationFailed(
                    "certificate bundle signature mismatch".to_string(),
                ))
            }
            Err(e) => return Err(TrustError::DownloadVerificationFailed(e.to_string())),
        }

        let mut serials: Vec<String> = admitted
            .iter()
            .map(|cert| cert.serial_number().to_string())
            .collect();
        serials.sort();

        let stored: Vec<StoredCertificate> = admitted.iter().map(StoredCertificate::from).collect();
        self.store.replace_all(admitted);

        let persisted = match self.repository.save_all(&stored).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist platform certificates");
                false
            }
        };

        tracing::info!(
            admitted = ?serials,
            discarded = total - serials.len(),
            persisted,
            "Platform certificates refreshed"
        );

        Ok(RefreshReport {
            discarded: total - serials.len(),
            admitted: serials,
            persisted,
        })
    }

    fn pre_check(
        &self,
        existing: &CertificateSnapshot,
        headers: &SignatureHeaders,
        response: &PlatformResponse,
    ) -> Result<(), TrustError> {
        if existing.is_empty() {
            tracing::debug!("Empty trust store, deferring bundle verification to downloaded set");
            return Ok(());
        }

        match Verifier::verify_in(
            existing,
            &headers.serial_number,
            &headers.timestamp,
            &headers.nonce,
            response.body.as_bytes(),
            &headers.signature,
        ) {
            Ok(true) => Ok(()),
            Ok(false) => Err(TrustError::DownloadVerificationFailed(
                "certificate bundle signature mismatch".to_string(),
            )),
            Err(TrustError::UnknownCertificate(serial)) => {
                tracing::debug!(serial_no = %serial, "Bundle signed by a certificate not yet trusted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn admit_entry(
        &self,
        entry: &BundleEntry,
        now: chrono::DateTime<Utc>,
    ) -> Result<PlatformCertificate, TrustError> {
        let pem = codec::decrypt_resource(self.identity.symmetric_key(), &entry.encrypt_certificate)
            .map_err(|e| TrustError::CertificateInvalid(e.to_string()))?;
        let cert = PlatformCertificate::from_pem(pem.as_bytes())?;

        if !cert.serial_number().eq_ignore_ascii_case(&entry.serial_no) {
            return Err(TrustError::CertificateInvalid(format!(
                "entry serial {} does not match certificate serial {}",
                entry.serial_no,
                cert.serial_number()
            )));
        }

        cert.check_admissible(&self.policy.trusted_root, now)?;
        Ok(cert)
    }
}

fn check_status(response: &PlatformResponse) -> Result<(), TrustError> {
    if response.is_success() {
        return Ok(());
    }
    let message = format!(
        "certificate endpoint returned {}: {}",
        response.status, response.body
    );
    if response.status >= 500 {
        Err(TrustError::Transport(message))
    } else {
        Err(TrustError::Configuration(message))
    }
}

fn union_with_existing(
    admitted: &[PlatformCertificate],
    existing: &CertificateSnapshot,
) -> CertificateSnapshot {
    let carried = existing
        .iter()
        .filter(|cert| !admitted.iter().any(|a| a.serial_number() == cert.serial_number()))
        .map(|cert| PlatformCertificate::clone(cert));
    CertificateSnapshot::new(admitted.iter().cloned().chain(carried))
}
