//! Reqwest-backed platform transport.
//!
//! Signs every request with the merchant key (`Authorization:
//! WECHATPAY2-SHA256-RSA2048 ...`) and returns the raw response for the caller
//! to verify.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::trust::Signer;
use crate::ports::{
    HttpMethod, PlatformRequest, PlatformResponse, PlatformTransport, TransportError,
};

const USER_AGENT: &str = concat!("wechatpay-trust/", env!("CARGO_PKG_VERSION"));

/// HTTP transport against the platform API.
pub struct ReqwestTransport {
    base_url: String,
    signer: Signer,
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        signer: Signer,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Connection(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer,
            http_client,
        })
    }

    fn map_send_error(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

#[async_trait]
impl PlatformTransport for ReqwestTransport {
    async fn execute(&self, request: PlatformRequest) -> Result<PlatformResponse, TransportError> {
        let signed = self
            .signer
            .sign_request(request.method.as_str(), &request.path_and_query, &request.body)
            .map_err(|e| TransportError::Signing(e.to_string()))?;
        let authorization = self.signer.authorization_header(&signed);
        let url = format!("{}{}", self.base_url, request.path_and_query);

        tracing::debug!(
            method = request.method.as_str(),
            path = %request.path_and_query,
            "Calling platform API"
        );

        let builder = match request.method {
            HttpMethod::Get => self.http_client.get(&url),
            HttpMethod::Post => self
                .http_client
                .post(&url)
                .header("Content-Type", "application/json")
                .body(request.body),
        };

        let response = builder
            .header("Authorization", authorization)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else {
                TransportError::InvalidResponse(e.to_string())
            }
        })?;
        // Signatures cover the exact bytes; never decode lossily.
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| TransportError::InvalidResponse(format!("body is not UTF-8: {e}")))?;

        if status >= 400 {
            tracing::warn!(status, path = %request.path_and_query, "Platform API returned error status");
        }

        Ok(PlatformResponse {
            status,
            headers,
            body,
        })
    }
}
