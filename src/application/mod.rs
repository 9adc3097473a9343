//! Application layer - orchestration across domain and ports.
//!
//! - `CertificateDownloader` - bootstrap-aware platform certificate rotation

mod certificate_downloader;

pub use certificate_downloader::{
    BundleEntry, CertificateBundle, CertificateDownloader, RefreshPolicy, RefreshReport,
    CERTIFICATES_PATH,
};
