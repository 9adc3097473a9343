//! Platform signature headers carried by responses and notifications.

use std::collections::HashMap;

use axum::http::HeaderMap;

use super::errors::NotificationError;

pub const HEADER_SERIAL: &str = "wechatpay-serial";
pub const HEADER_TIMESTAMP: &str = "wechatpay-timestamp";
pub const HEADER_NONCE: &str = "wechatpay-nonce";
pub const HEADER_SIGNATURE: &str = "wechatpay-signature";

/// The four values needed to verify a platform signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    pub serial_number: String,
    pub timestamp: String,
    pub nonce: String,
    pub signature: String,
}

impl SignatureHeaders {
    /// Collects the headers through `lookup`, which receives lower-case names.
    ///
    /// Empty values count as missing.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::MissingVerificationHeaders` naming every
    /// header that is absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NotificationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut take = |name: &'static str| {
            match lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                Some(value) => value,
                None => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let headers = Self {
            serial_number: take(HEADER_SERIAL),
            timestamp: take(HEADER_TIMESTAMP),
            nonce: take(HEADER_NONCE),
            signature: take(HEADER_SIGNATURE),
        };

        if missing.is_empty() {
            Ok(headers)
        } else {
            Err(NotificationError::MissingVerificationHeaders(
                missing.join(", "),
            ))
        }
    }

    /// Reads the headers from an HTTP header map (names are case-insensitive).
    pub fn from_header_map(headers: &HeaderMap) -> Result<Self, NotificationError> {
        Self::from_lookup(|name| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
    }

    /// Reads the headers from a map keyed by lower-case header names.
    pub fn from_map(headers: &HashMap<String, String>) -> Result<Self, NotificationError> {
        Self::from_lookup(|name| headers.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn full_map() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Wechatpay-Serial", HeaderValue::from_static("ABC"));
        headers.insert("Wechatpay-Timestamp", HeaderValue::from_static("1700000000"));
        headers.insert("Wechatpay-Nonce", HeaderValue::from_static("nonce"));
        headers.insert("Wechatpay-Signature", HeaderValue::from_static("c2ln"));
        headers
    }

    #[test]
    fn reads_all_headers_case_insensitively() {
        let headers = SignatureHeaders::from_header_map(&full_map()).unwrap();
        assert_eq!(headers.serial_number, "ABC");
        assert_eq!(headers.timestamp, "1700000000");
        assert_eq!(headers.nonce, "nonce");
        assert_eq!(headers.signature, "c2ln");
    }

    #[test]
    fn missing_header_is_reported_by_name() {
        let mut map = full_map();
        map.remove("wechatpay-nonce");

        let err = SignatureHeaders::from_header_map(&map).unwrap_err();
        match err {
            NotificationError::MissingVerificationHeaders(names) => {
                assert_eq!(names, "wechatpay-nonce")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut map = full_map();
        map.insert("wechatpay-signature", HeaderValue::from_static(""));
        assert!(SignatureHeaders::from_header_map(&map).is_err());
    }

    #[test]
    fn reads_from_lowercase_string_map() {
        let map: HashMap<String, String> = [
            (HEADER_SERIAL, "S"),
            (HEADER_TIMESTAMP, "1"),
            (HEADER_NONCE, "n"),
            (HEADER_SIGNATURE, "sig"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let headers = SignatureHeaders::from_map(&map).unwrap();
        assert_eq!(headers.serial_number, "S");
    }

    #[test]
    fn no_headers_lists_all_four() {
        let err = SignatureHeaders::from_map(&HashMap::new()).unwrap_err();
        let message = err.to_string();
        for name in [HEADER_SERIAL, HEADER_TIMESTAMP, HEADER_NONCE, HEADER_SIGNATURE] {
            assert!(message.contains(name));
        }
    }
}
