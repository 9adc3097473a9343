//! Required-parameter checks for business endpoints.
//!
//! Runs before any network call. A value counts as missing when it is absent,
//! null, an empty string, `"0"`, zero, `false`, or an empty array/object.

use serde_json::{Map, Value};
use thiserror::Error;

/// A business request failed its parameter checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestValidationError {
    #[error("Missing required parameter: {0}")]
    MissingField(String),

    #[error("One of {0} is required")]
    MissingOneOf(String),

    #[error("Invalid identifier for {field}: {value:?}")]
    InvalidIdentifier { field: String, value: String },
}

const UNIFIED_BASE: &[&str] = &[
    "sp_appid",
    "sp_mchid",
    "sub_mchid",
    "description",
    "out_trade_no",
    "notify_url",
];
const UNIFIED_AMOUNT: &[&str] = &["total"];
const QUERY_ORDER: &[&str] = &["sp_mchid", "sub_mchid"];
const REFUND_BASE: &[&str] = &["sub_mchid", "out_refund_no"];
const REFUND_AMOUNT: &[&str] = &["refund", "total", "currency"];
const BILL: &[&str] = &["bill_date"];

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty() || s == "0",
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Bool(b)) => !b,
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
    }
}

fn require(params: &Map<String, Value>, prefix: &str, fields: &[&str]) -> Result<(), RequestValidationError> {
    match fields.iter().find(|field| is_blank(params.get(**field))) {
        Some(field) => Err(RequestValidationError::MissingField(format!("{prefix}{field}"))),
        None => Ok(()),
    }
}

fn require_nested(
    params: &Map<String, Value>,
    key: &str,
    fields: &[&str],
) -> Result<(), RequestValidationError> {
    let empty = Map::new();
    let nested = params.get(key).and_then(Value::as_object).unwrap_or(&empty);
    require(nested, &format!("{key}."), fields)
}

fn require_one_of(params: &Map<String, Value>, prefix: &str, fields: &[&str]) -> Result<(), RequestValidationError> {
    if fields.iter().all(|field| is_blank(params.get(*field))) {
        let names: Vec<String> = fields.iter().map(|f| format!("{prefix}{f}")).collect();
        return Err(RequestValidationError::MissingOneOf(names.join("|")));
    }
    Ok(())
}

/// JSAPI unified order: base fields, `amount.total`, and a payer openid.
pub fn check_unified(params: &Map<String, Value>) -> Result<(), RequestValidationError> {
    require(params, "", UNIFIED_BASE)?;
    require_nested(params, "amount", UNIFIED_AMOUNT)?;

    let empty = Map::new();
    let payer = params.get("payer").and_then(Value::as_object).unwrap_or(&empty);
    require_one_of(payer, "payer.", &["sp_openid", "sub_openid"])
}

/// Order queries and close: service-provider and sub-merchant ids.
pub fn check_query(params: &Map<String, Value>) -> Result<(), RequestValidationError> {
    require(params, "", QUERY_ORDER)
}

/// Refund request.
pub fn check_refund(params: &Map<String, Value>) -> Result<(), RequestValidationError> {
    require_one_of(params, "", &["transaction_id", "out_trade_no"])?;
    require(params, "", REFUND_BASE)?;
    require_nested(params, "amount", REFUND_AMOUNT)
}

/// Single refund query.
pub fn check_refund_query(params: &Map<String, Value>) -> Result<(), RequestValidationError> {
    require(params, "", &["sub_mchid"])
}

/// Trade and fund-flow bills.
pub fn check_bill(params: &Map<String, Value>) -> Result<(), RequestValidationError> {
    require(params, "", BILL)
}

/// An id that becomes a URL path segment.
pub fn check_identifier(field: &str, value: &str) -> Result<(), RequestValidationError> {
    if value.is_empty() {
        return Err(RequestValidationError::MissingField(field.to_string()));
    }
    let path_safe = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '*' | '|' | '@'));
    if !path_safe {
        return Err(RequestValidationError::InvalidIdentifier {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}
