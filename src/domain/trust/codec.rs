//! Cryptographic primitives used by the trust subsystem.
//!
//! - AES-256-GCM authenticated decryption of platform resources
//! - SHA256-RSA (PKCS#1 v1.5) signatures, base64 encoded
//!
//! Everything here is stateless. Decryption fails closed: a tag mismatch or a
//! malformed input yields an error, never partial plaintext.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::errors::TrustError;

/// Algorithm identifier the platform uses for encrypted resources.
pub const AEAD_AES_256_GCM: &str = "AEAD_AES_256_GCM";

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// GCM nonce size in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// An AEAD-wrapped payload as delivered by the platform.
///
/// Used both for certificate bundle entries and notification resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedResource {
    pub algorithm: String,
    #[serde(default)]
    pub associated_data: Option<String>,
    pub nonce: String,
    /// Base64 of ciphertext followed by the 16-byte tag.
    pub ciphertext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_type: Option<String>,
}

/// Decrypts `ciphertext` (ciphertext || tag) with AES-256-GCM.
///
/// # Errors
///
/// Returns `TrustError::Decrypt` on a wrong key or nonce length, or when the
/// authentication tag does not match.
pub fn decrypt_aead(
    key: &[u8],
    nonce: &[u8],
    associated_data: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, TrustError> {
    let cipher = cipher_for(key)?;
    if nonce.len() != NONCE_SIZE {
        return Err(TrustError::Decrypt(format!(
            "Invalid nonce length: expected {} bytes, got {}",
            NONCE_SIZE,
            nonce.len()
        )));
    }

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: associated_data,
            },
        )
        .map_err(|_| TrustError::Decrypt("authentication failed".to_string()))
}

/// Encrypts `plaintext` with AES-256-GCM, returning ciphertext || tag.
pub fn encrypt_aead(
    key: &[u8],
    nonce: &[u8],
    associated_data: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, TrustError> {
    let cipher = cipher_for(key)?;
    if nonce.len() != NONCE_SIZE {
        return Err(TrustError::Decrypt(format!(
            "Invalid nonce length: expected {} bytes, got {}",
            NONCE_SIZE,
            nonce.len()
        )));
    }

    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad: associated_data,
            },
        )
        .map_err(|e| TrustError::Decrypt(e.to_string()))
}

/// Decrypts a platform resource into a UTF-8 string.
pub fn decrypt_resource(key: &[u8], resource: &EncryptedResource) -> Result<String, TrustError> {
    if resource.algorithm != AEAD_AES_256_GCM {
        return Err(TrustError::Decrypt(format!(
            "Unsupported algorithm: {}",
            resource.algorithm
        )));
    }

    let ciphertext = BASE64
        .decode(resource.ciphertext.as_bytes())
        .map_err(|e| TrustError::Decrypt(format!("Base64 decode failed: {e}")))?;
    let associated_data = resource.associated_data.as_deref().unwrap_or_default();

    let plaintext = decrypt_aead(
        key,
        resource.nonce.as_bytes(),
        associated_data.as_bytes(),
        &ciphertext,
    )?;

    String::from_utf8(plaintext).map_err(|e| TrustError::Decrypt(e.to_string()))
}

/// Wraps `plaintext` into an `EncryptedResource` the way the platform does.
pub fn encrypt_resource(
    key: &[u8],
    nonce: &str,
    associated_data: &str,
    plaintext: &[u8],
) -> Result<EncryptedResource, TrustError> {
    let ciphertext = encrypt_aead(key, nonce.as_bytes(), associated_data.as_bytes(), plaintext)?;
    Ok(EncryptedResource {
        algorithm: AEAD_AES_256_GCM.to_string(),
        associated_data: Some(associated_data.to_string()),
        nonce: nonce.to_string(),
        ciphertext: BASE64.encode(ciphertext),
        original_type: None,
    })
}

/// Signs `message` with SHA256-RSA and returns the base64 signature.
pub fn sign(private_key: &RsaPrivateKey, message: &[u8]) -> Result<String, TrustError> {
    let signing_key = SigningKey::<Sha256>::new(private_key.clone());
    let signature = signing_key
        .try_sign_with_rng(&mut rand::thread_rng(), message)
        .map_err(|e| TrustError::Configuration(format!("Signing failed: {e}")))?;
    Ok(BASE64.encode(signature.to_bytes()))
}

/// Verifies a base64 SHA256-RSA signature.
///
/// Returns `false` for any mismatch, bad base64 or malformed signature.
pub fn verify(public_key: &RsaPublicKey, message: &[u8], signature_b64: &str) -> bool {
    let Ok(raw) = BASE64.decode(signature_b64.trim().as_bytes()) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(raw.as_slice()) else {
        return false;
    };

    VerifyingKey::<Sha256>::new(public_key.clone())
        .verify(message, &signature)
        .is_ok()
}

fn cipher_for(key: &[u8]) -> Result<Aes256Gcm, TrustError> {
    if key.len() != KEY_SIZE {
        return Err(TrustError::Decrypt(format!(
            "Invalid key length: expected {} bytes, got {}",
            KEY_SIZE,
            key.len()
        )));
    }
    Aes256Gcm::new_from_slice(key).map_err(|e| TrustError::Decrypt(e.to_string()))
}
