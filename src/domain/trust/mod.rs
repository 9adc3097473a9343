//! Trust domain module.
//!
//! Signing, signature verification, payload decryption and the trusted
//! platform certificate set.
//!
//! # Module Structure
//!
//! - `codec` - AEAD and SHA256-RSA primitives
//! - `merchant` - MerchantIdentity (private key + API v3 key)
//! - `certificate` - PlatformCertificate parsing and admission rules
//! - `certificate_store` - Atomically replaceable trusted set
//! - `signer` - Canonical strings, request and payment signatures
//! - `verifier` - Platform signature verification

pub mod codec;
mod certificate;
mod certificate_store;
mod errors;
mod merchant;
mod signer;
mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use certificate::{PlatformCertificate, TRUSTED_ROOT_COMMON_NAME};
pub use certificate_store::{CertificateSnapshot, CertificateStore};
pub use codec::EncryptedResource;
pub use errors::TrustError;
pub use merchant::{parse_private_key, MerchantIdentity};
pub use signer::{
    canonical_lines, generate_nonce, JsApiParams, SignedMessage, Signer, AUTHORIZATION_SCHEME,
};
pub use verifier::{platform_message, Verifier};
