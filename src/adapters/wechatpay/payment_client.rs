//! Payment client - service-provider business endpoints.
//!
//! Each call validates its parameters, sends a signed request through the
//! transport and verifies the platform's response signature. Outcomes come
//! back as an `ApiResponse`; only parameter validation is an `Err`.

use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::CertificateDownloader;
use crate::domain::notification::SignatureHeaders;
use crate::domain::trust::{JsApiParams, Signer, TrustError, Verifier};
use crate::ports::{PlatformRequest, PlatformResponse, PlatformTransport};

use super::api;
use super::request_validator::{self as validator, RequestValidationError};

/// Status reported when a 2xx response fails signature verification.
pub const UNVERIFIED_RESPONSE_CODE: u16 = 502;

/// Status reported when the request never produced a response.
pub const TRANSPORT_FAILURE_CODE: u16 = 500;

/// Structured result of a business call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: u16,
    pub message: String,
    pub data: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    fn empty(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Value::Null,
        }
    }
}

/// Service-provider identifiers injected into every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerContext {
    pub sp_app_id: String,
    pub sp_merchant_id: String,
    pub sub_merchant_id: String,
    pub sub_app_id: Option<String>,
}

/// Client for order, refund and bill endpoints.
pub struct PaymentClient {
    transport: Arc<dyn PlatformTransport>,
    verifier: Verifier,
    downloader: Arc<CertificateDownloader>,
    signer: Signer,
    partner: PartnerContext,
}

impl PaymentClient {
    pub fn new(
        transport: Arc<dyn PlatformTransport>,
        verifier: Verifier,
        downloader: Arc<CertificateDownloader>,
        signer: Signer,
        partner: PartnerContext,
    ) -> Self {
        Self {
            transport,
            verifier,
            downloader,
            signer,
            partner,
        }
    }

    /// JSAPI unified order.
    ///
    /// `params` holds the order body without `sp_appid`, `sp_mchid` and
    /// `sub_mchid`. On HTTP 200 `data` becomes
    /// `{"jsApiParams": {...}, "prepay_id": "..."}`.
    pub async fn unified_order(
        &self,
        mut params: Map<String, Value>,
    ) -> Result<ApiResponse, RequestValidationError> {
        params.insert("sp_appid".into(), Value::from(self.partner.sp_app_id.clone()));
        params.insert("sp_mchid".into(), Value::from(self.partner.sp_merchant_id.clone()));
        params.insert("sub_mchid".into(), Value::from(self.partner.sub_merchant_id.clone()));
        if let Some(sub_app_id) = &self.partner.sub_app_id {
            params
                .entry("sub_appid")
                .or_insert_with(|| Value::from(sub_app_id.clone()));
        }
        validator::check_unified(&params)?;

        let mut result = self
            .send(PlatformRequest::post(
                api::UNIFIED_ORDER_JSAPI,
                Value::Object(params).to_string(),
            ))
            .await;

        if result.code == 200 {
            let Some(prepay_id) = result.data.get("prepay_id").and_then(Value::as_str) else {
                return Ok(ApiResponse::empty(
                    UNVERIFIED_RESPONSE_CODE,
                    "unified order response carried no prepay_id",
                ));
            };
            let prepay_id = prepay_id.to_string();
            let package = format!("prepay_id={}", prepay_id);

            match self.signer.sign_payment(&self.partner.sp_app_id, &package) {
                Ok(signed) => {
                    let js_api = JsApiParams::from_signed(&self.partner.sp_app_id, &package, &signed);
                    result.data = serde_json::json!({
                        "jsApiParams": js_api,
                        "prepay_id": prepay_id,
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to sign JSAPI parameters");
                    return Ok(ApiResponse::empty(TRANSPORT_FAILURE_CODE, e.to_string()));
                }
            }
        }

        Ok(result)
    }

    /// Query an order by platform transaction id.
    pub async fn query_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<ApiResponse, RequestValidationError> {
        validator::check_identifier("transaction_id", transaction_id)?;
        let path = self.merchant_query(&api::transaction_by_id(transaction_id))?;
        Ok(self.send(PlatformRequest::get(path)).await)
    }

    /// Query an order by merchant order number.
    pub async fn query_by_out_trade_no(
        &self,
        out_trade_no: &str,
    ) -> Result<ApiResponse, RequestValidationError> {
        validator::check_identifier("out_trade_no", out_trade_no)?;
        let path = self.merchant_query(&api::transaction_by_out_trade_no(out_trade_no))?;
        Ok(self.send(PlatformRequest::get(path)).await)
    }

    /// Close an unpaid order. Success is HTTP 204 with an empty body.
    pub async fn close_order(&self, out_trade_no: &str) -> Result<ApiResponse, RequestValidationError> {
        validator::check_identifier("out_trade_no", out_trade_no)?;
        let params = self.merchant_params();
        validator::check_query(&params)?;
        Ok(self
            .send(PlatformRequest::post(
                api::close_transaction(out_trade_no),
                Value::Object(params).to_string(),
            ))
            .await)
    }

    /// Request a refund. `params` excludes `sub_mchid`.
    pub async fn refund(
        &self,
        mut params: Map<String, Value>,
    ) -> Result<ApiResponse, RequestValidationError> {
        params.insert("sub_mchid".into(), Value::from(self.partner.sub_merchant_id.clone()));
        validator::check_refund(&params)?;
        Ok(self
            .send(PlatformRequest::post(api::REFUNDS, Value::Object(params).to_string()))
            .await)
    }

    /// Query a single refund by merchant refund number.
    pub async fn query_refund(&self, out_refund_no: &str) -> Result<ApiResponse, RequestValidationError> {
        validator::check_identifier("out_refund_no", out_refund_no)?;
        let mut params = Map::new();
        params.insert("sub_mchid".into(), Value::from(self.partner.sub_merchant_id.clone()));
        validator::check_refund_query(&params)?;

        let path = api::with_query(
            &api::refund_by_out_refund_no(out_refund_no),
            [("sub_mchid", self.partner.sub_merchant_id.as_str())],
        );
        Ok(self.send(PlatformRequest::get(path)).await)
    }

    /// Request a trade bill download URL.
    pub async fn trade_bill(&self, params: &Map<String, Value>) -> Result<ApiResponse, RequestValidationError> {
        self.bill(api::TRADE_BILL, params).await
    }

    /// Request a fund-flow bill download URL.
    pub async fn fund_flow_bill(
        &self,
        params: &Map<String, Value>,
    ) -> Result<ApiResponse, RequestValidationError> {
        self.bill(api::FUND_FLOW_BILL, params).await
    }

    async fn bill(
        &self,
        endpoint: &str,
        params: &Map<String, Value>,
    ) -> Result<ApiResponse, RequestValidationError> {
        validator::check_bill(params)?;
        let rendered: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.clone(), query_value(v)))
            .collect();
        let path = api::with_query(
            endpoint,
            rendered.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
        Ok(self.send(PlatformRequest::get(path)).await)
    }

    fn merchant_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("sp_mchid".into(), Value::from(self.partner.sp_merchant_id.clone()));
        params.insert("sub_mchid".into(), Value::from(self.partner.sub_merchant_id.clone()));
        params
    }

    fn merchant_query(&self, path: &str) -> Result<String, RequestValidationError> {
        validator::check_query(&self.merchant_params())?;
        Ok(api::with_query(
            path,
            [
                ("sp_mchid", self.partner.sp_merchant_id.as_str()),
                ("sub_mchid", self.partner.sub_merchant_id.as_str()),
            ],
        ))
    }

    /// Sends, verifies and shapes one request. Never fails across this boundary.
    async fn send(&self, request: PlatformRequest) -> ApiResponse {
        let path = request.path_and_query.clone();
        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Platform request failed");
                return ApiResponse::empty(TRANSPORT_FAILURE_CODE, e.to_string());
            }
        };

        let message = StatusCode::from_u16(response.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();
        let data = parse_data(&response.body);

        if !response.is_success() {
            return ApiResponse {
                code: response.status,
                message,
                data,
            };
        }

        if let Err(e) = self.verify_response(&response).await {
            tracing::warn!(path = %path, error = %e, "Platform response failed verification");
            return ApiResponse::empty(UNVERIFIED_RESPONSE_CODE, e.to_string());
        }

        ApiResponse {
            code: response.status,
            message,
            data,
        }
    }

    async fn verify_response(&self, response: &PlatformResponse) -> Result<(), TrustError> {
        let headers = SignatureHeaders::from_map(&response.headers)
            .map_err(|_| TrustError::SignatureInvalid)?;

        match self.check(&headers, response) {
            Err(TrustError::UnknownCertificate(serial)) => {
                tracing::info!(serial_no = %serial, "Unknown platform certificate, refreshing");
                self.downloader.refresh().await?;
                self.check(&headers, response)
            }
            other => other,
        }
    }

    fn check(&self, headers: &SignatureHeaders, response: &PlatformResponse) -> Result<(), TrustError> {
        let valid = self.verifier.verify(
            &headers.serial_number,
            &headers.timestamp,
            &headers.nonce,
            response.body.as_bytes(),
            &headers.signature,
        )?;
        if valid {
            Ok(())
        } else {
            Err(TrustError::SignatureInvalid)
        }
    }
}

fn parse_data(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
