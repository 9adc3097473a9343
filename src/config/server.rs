//! Listener settings for the notification webhook.

use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use super::error::ValidationError;

/// Longest timeout accepted for a webhook request or a platform call.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Where the webhook listens and how the process logs.
///
/// Every field is optional; an absent one takes its value from `Default`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// IP literal to bind; hostnames are not resolved.
    pub host: String,
    pub port: u16,
    /// Production switches logs to JSON and requires an HTTPS platform URL.
    pub environment: Environment,
    /// `tracing` filter, used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Bounds both an inbound delivery and each outbound platform call,
    /// including a certificate refresh triggered by a delivery.
    pub request_timeout_secs: u64,
}

/// Deployment environment.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::default(),
            log_level: "info,wechatpay_trust=debug".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Rejects settings that would only fail once the listener starts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        EnvFilter::try_new(&self.log_level)
            .map_err(|e| ValidationError::InvalidLogFilter(e.to_string()))?;
        Ok(())
    }
}
