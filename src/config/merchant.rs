//! Merchant identity configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::trust::{MerchantIdentity, TrustError};

const API_V3_KEY_LENGTH: usize = 32;

/// Merchant (service provider) identity and partner identifiers
#[derive(Debug, Clone, Deserialize)]
pub struct MerchantConfig {
    /// Service provider merchant id (`sp_mchid`)
    pub merchant_id: String,

    /// Serial number of the merchant API certificate
    pub certificate_serial_number: String,

    /// Path to the merchant private key (PEM)
    pub private_key_path: PathBuf,

    /// API v3 key used to decrypt platform resources
    pub api_v3_key: SecretString,

    /// Service provider app id (`sp_appid`)
    pub sp_app_id: String,

    /// Sub-merchant id (`sub_mchid`)
    pub sub_merchant_id: String,

    /// Sub-merchant app id (`sub_appid`)
    pub sub_app_id: Option<String>,
}

impl MerchantConfig {
    /// Load the private key and build the signing identity.
    pub fn identity(&self) -> Result<MerchantIdentity, TrustError> {
        MerchantIdentity::from_key_file(
            self.merchant_id.clone(),
            self.certificate_serial_number.clone(),
            &self.private_key_path,
            self.api_v3_key.expose_secret().clone(),
        )
    }

    /// Validate merchant configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.merchant_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("MERCHANT_ID"));
        }
        if self.certificate_serial_number.trim().is_empty() {
            return Err(ValidationError::MissingRequired("CERTIFICATE_SERIAL_NUMBER"));
        }
        if self.private_key_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("PRIVATE_KEY_PATH"));
        }
        if self.sp_app_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("SP_APP_ID"));
        }
        if self.sub_merchant_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("SUB_MERCHANT_ID"));
        }

        let key_length = self.api_v3_key.expose_secret().len();
        if key_length != API_V3_KEY_LENGTH {
            return Err(ValidationError::InvalidApiV3KeyLength(key_length));
        }

        Ok(())
    }
}
