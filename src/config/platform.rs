//! Platform API and certificate rotation configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::RefreshPolicy;

/// Platform endpoint and certificate refresh settings
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Directory holding the persisted certificate snapshot
    #[serde(default = "default_certificate_dir")]
    pub certificate_dir: PathBuf,

    /// Issuer common name every platform certificate must carry
    #[serde(default = "default_trusted_root_cn")]
    pub trusted_root_cn: String,

    /// Attempts per certificate refresh, counting the first
    #[serde(default = "default_refresh_max_attempts")]
    pub refresh_max_attempts: u32,

    /// Backoff before the first retry, doubled on each subsequent one
    #[serde(default = "default_refresh_backoff_millis")]
    pub refresh_backoff_millis: u64,
}

impl PlatformConfig {
    /// Refresh policy for the certificate downloader
    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            trusted_root: self.trusted_root_cn.clone(),
            max_attempts: self.refresh_max_attempts,
            initial_backoff: Duration::from_millis(self.refresh_backoff_millis),
        }
    }

    /// Validate platform configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://")
        {
            return Err(ValidationError::InvalidApiBaseUrl);
        }
        if production && !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::ApiBaseUrlMustBeHttps);
        }
        if self.certificate_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("CERTIFICATE_DIR"));
        }
        if self.trusted_root_cn.trim().is_empty() {
            return Err(ValidationError::MissingRequired("TRUSTED_ROOT_CN"));
        }
        if self.refresh_max_attempts == 0 || self.refresh_max_attempts > 10 {
            return Err(ValidationError::InvalidRefreshAttempts);
        }
        Ok(())
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            certificate_dir: default_certificate_dir(),
            trusted_root_cn: default_trusted_root_cn(),
            refresh_max_attempts: default_refresh_max_attempts(),
            refresh_backoff_millis: default_refresh_backoff_millis(),
        }
    }
}

fn default_api_base_url() -> String {
    crate::adapters::wechatpay::api::DEFAULT_API_BASE_URL.to_string()
}

fn default_certificate_dir() -> PathBuf {
    PathBuf::from("certificates")
}

fn default_trusted_root_cn() -> String {
    crate::domain::trust::TRUSTED_ROOT_COMMON_NAME.to_string()
}

fn default_refresh_max_attempts() -> u32 {
    3
}

fn default_refresh_backoff_millis() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_config_defaults() {
        let config = PlatformConfig::default();
        assert_eq!(config.api_base_url, "https://api.mch.weixin.qq.com");
        assert_eq!(config.trusted_root_cn, "Tenpay.com Root CA");
        assert_eq!(config.refresh_max_attempts, 3);
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_refresh_policy_conversion() {
        let config = PlatformConfig {
            refresh_max_attempts: 5,
            refresh_backoff_millis: 250,
            ..Default::default()
        };
        let policy = config.refresh_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(250));
        assert_eq!(policy.trusted_root, "Tenpay.com Root CA");
    }

    #[test]
    fn test_validation_rejects_non_http_url() {
        let config = PlatformConfig {
            api_base_url: "ftp://api.example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(false), Err(ValidationError::InvalidApiBaseUrl));
    }

    #[test]
    fn test_validation_http_only_outside_production() {
        let config = PlatformConfig {
            api_base_url: "http://localhost:9000".to_string(),
            ..Default::default()
        };
        assert!(config.validate(false).is_ok());
        assert_eq!(
            config.validate(true),
            Err(ValidationError::ApiBaseUrlMustBeHttps)
        );
    }

    #[test]
    fn test_validation_refresh_attempts_bounds() {
        let config = PlatformConfig {
            refresh_max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(false),
            Err(ValidationError::InvalidRefreshAttempts)
        );

        let config = PlatformConfig {
            refresh_max_attempts: 11,
            ..Default::default()
        };
        assert!(config.validate(false).is_err());
    }
}
