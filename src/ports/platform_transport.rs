//! Platform Transport Port - the HTTP collaborator that talks to the platform.
//!
//! Implementations sign outbound requests and return the raw response so the
//! caller can verify the platform signature over the exact body bytes.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// HTTP methods used against the platform API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An outbound platform request.
///
/// `path_and_query` is relative to the configured API base URL, e.g.
/// `/v3/certificates`. For GET requests `body` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRequest {
    pub method: HttpMethod,
    pub path_and_query: String,
    pub body: String,
}

impl PlatformRequest {
    pub fn get(path_and_query: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path_and_query: path_and_query.into(),
            body: String::new(),
        }
    }

    pub fn post(path_and_query: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            path_and_query: path_and_query.into(),
            body: body.into(),
        }
    }
}

/// Raw platform response.
///
/// Header names are lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl PlatformResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Transport failures. A non-2xx status is NOT a transport failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    pub fn timed_out(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// Port for sending signed requests to the platform.
#[async_trait]
pub trait PlatformTransport: Send + Sync {
    async fn execute(&self, request: PlatformRequest) -> Result<PlatformResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = PlatformResponse {
            status: 200,
            headers: HashMap::from([("wechatpay-serial".to_string(), "ABC".to_string())]),
            body: String::new(),
        };
        assert_eq!(response.header("Wechatpay-Serial"), Some("ABC"));
        assert!(response.is_success());
    }

    #[test]
    fn non_2xx_is_not_success() {
        let response = PlatformResponse {
            status: 404,
            headers: HashMap::new(),
            body: String::new(),
        };
        assert!(!response.is_success());
    }

    #[test]
    fn only_timeout_reports_timed_out() {
        assert!(TransportError::Timeout("5s".into()).timed_out());
        assert!(!TransportError::Connection("refused".into()).timed_out());
    }

    #[test]
    fn get_request_has_empty_body() {
        let request = PlatformRequest::get("/v3/certificates");
        assert_eq!(request.method.as_str(), "GET");
        assert!(request.body.is_empty());
    }
}
