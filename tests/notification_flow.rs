//! Integration tests for the notification webhook.
//!
//! Sends platform-shaped deliveries through the axum router and checks both
//! the reply the platform sees and what reaches the business handler.

mod common;

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use tower::ServiceExt;

use common::*;
use wechatpay_trust::adapters::http::{notification_router, NotificationAppState, NOTIFICATION_PATH};
use wechatpay_trust::adapters::InMemoryCertificateRepository;
use wechatpay_trust::application::CertificateDownloader;
use wechatpay_trust::domain::notification::{
    HandlerOutcome, NotificationEvent, NotificationHandler, NotificationProcessor,
    NotificationResponse, NotificationResult,
};
use wechatpay_trust::domain::trust::{codec, CertificateStore, PlatformCertificate, Verifier};

const TRANSACTION: &str = r#"{"sp_mchid":"1900000001","sub_mchid":"1900000109","out_trade_no":"1217752501201407033233368018","transaction_id":"1217752501201407033233368018","trade_state":"SUCCESS","success_time":"2018-06-08T10:34:56+08:00","amount":{"total":100,"currency":"CNY"}}"#;

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Records every event it is handed and answers with a fixed outcome.
struct RecordingHandler {
    events: Mutex<Vec<NotificationEvent>>,
    outcome: HandlerOutcome,
}

impl RecordingHandler {
    fn new(outcome: HandlerOutcome) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            outcome,
        })
    }

    fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl NotificationHandler for RecordingHandler {
    fn handle(&self, event: &NotificationEvent) -> HandlerOutcome {
        self.events.lock().unwrap().push(event.clone());
        self.outcome.clone()
    }
}

fn app(handler: Arc<RecordingHandler>) -> Router {
    app_with(handler, ScriptedTransport::new(Vec::new()))
}

/// Router whose certificate refreshes are answered by `transport`.
fn app_with(handler: Arc<RecordingHandler>, transport: Arc<ScriptedTransport>) -> Router {
    let certificate = PlatformCertificate::from_pem(PLATFORM_CERT_PEM.as_bytes()).unwrap();
    let store = Arc::new(CertificateStore::with_certificates(vec![certificate]));
    let processor = NotificationProcessor::new(identity(), Verifier::new(store.clone())).unwrap();
    let downloader = CertificateDownloader::new(
        identity(),
        store,
        transport,
        Arc::new(InMemoryCertificateRepository::new()),
        fast_policy(),
    );
    notification_router().with_state(NotificationAppState::new(
        Arc::new(processor),
        handler,
        Arc::new(downloader),
    ))
}

fn transaction_body(payload: &str) -> String {
    let resource = codec::encrypt_resource(
        API_V3_KEY.as_bytes(),
        "fdasflkja484",
        "transaction",
        payload.as_bytes(),
    )
    .unwrap();
    serde_json::json!({
        "id": "EV-2018022511223320873",
        "create_time": "2015-05-20T13:29:35+08:00",
        "resource_type": "encrypt-resource",
        "event_type": "TRANSACTION.SUCCESS",
        "summary": "支付成功",
        "resource": resource,
    })
    .to_string()
}

fn delivery(serial: &str, signature: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(NOTIFICATION_PATH)
        .header("Content-Type", "application/json")
        .header("Wechatpay-Serial", serial)
        .header("Wechatpay-Timestamp", TIMESTAMP)
        .header("Wechatpay-Nonce", "notify-nonce")
        .header("Wechatpay-Signature", signature)
        .body(Body::from(body))
        .unwrap()
}

fn signed_delivery(body: String) -> Request<Body> {
    let signature = platform_signature(platform_key(), "notify-nonce", &body);
    delivery(PLATFORM_SERIAL, &signature, body)
}

async fn reply(app: Router, request: Request<Body>) -> (StatusCode, NotificationResponse) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Accepted deliveries
// =============================================================================

#[tokio::test]
async fn transaction_success_is_decrypted_and_dispatched() {
    let handler = RecordingHandler::new(HandlerOutcome::success());

    let (status, body) = reply(app(handler.clone()), signed_delivery(transaction_body(TRANSACTION))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.code, "SUCCESS");

    let events = handler.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.id, "EV-2018022511223320873");
    assert_eq!(event.result, NotificationResult::Success);
    assert_eq!(event.payload_str("trade_state"), Some("SUCCESS"));
    assert_eq!(
        event.create_time,
        Some(Utc.with_ymd_and_hms(2015, 5, 20, 5, 29, 35).unwrap())
    );
    assert_eq!(
        event.success_time(),
        Some(Utc.with_ymd_and_hms(2018, 6, 8, 2, 34, 56).unwrap())
    );
}

#[tokio::test]
async fn other_event_types_are_dispatched_without_decrypting() {
    let handler = RecordingHandler::new(HandlerOutcome::success());
    let body = serde_json::json!({
        "id": "EV-refund",
        "event_type": "REFUND.SUCCESS",
        "summary": "退款成功",
        "resource": {
            "algorithm": "AEAD_AES_256_GCM",
            "nonce": "not-decrypted",
            "ciphertext": "bm90LWRlY3J5cHRlZA==",
            "original_type": "refund"
        }
    })
    .to_string();

    let (status, _) = reply(app(handler.clone()), signed_delivery(body)).await;

    assert_eq!(status, StatusCode::OK);
    let events = handler.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].result, NotificationResult::Fail);
    assert!(events[0].decrypted_payload.is_none());
}

#[tokio::test]
async fn delivery_from_rotated_certificate_is_accepted_after_refresh() {
    let handler = RecordingHandler::new(HandlerOutcome::success());
    let transport = ScriptedTransport::new(vec![Ok(bundle_response(
        &[
            (PLATFORM_SERIAL, PLATFORM_CERT_PEM),
            (PLATFORM_NEXT_SERIAL, PLATFORM_CERT_NEXT_PEM),
        ],
        PLATFORM_NEXT_SERIAL,
        platform_key_next(),
    ))]);
    let body = transaction_body(TRANSACTION);
    let signature = platform_signature(platform_key_next(), "notify-nonce", &body);

    let (status, reply_body) = reply(
        app_with(handler.clone(), transport.clone()),
        delivery(PLATFORM_NEXT_SERIAL, &signature, body),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply_body.code, "SUCCESS");
    assert_eq!(transport.calls(), 1);
    let events = handler.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].result, NotificationResult::Success);
}

#[tokio::test]
async fn known_serial_never_triggers_refresh() {
    let handler = RecordingHandler::new(HandlerOutcome::success());
    let transport = ScriptedTransport::new(Vec::new());

    let (status, _) = reply(
        app_with(handler.clone(), transport.clone()),
        signed_delivery(transaction_body(TRANSACTION)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn handler_failure_asks_platform_to_redeliver() {
    let handler = RecordingHandler::new(HandlerOutcome::failure("order store unavailable"));

    let (status, body) = reply(app(handler.clone()), signed_delivery(transaction_body(TRANSACTION))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.code, "ERROR");
    assert_eq!(handler.events().len(), 1);
}

// =============================================================================
// Rejected deliveries
// =============================================================================

#[tokio::test]
async fn tampered_body_never_reaches_handler() {
    let handler = RecordingHandler::new(HandlerOutcome::success());
    let body = transaction_body(TRANSACTION);
    let signature = platform_signature(platform_key(), "notify-nonce", &body);
    let tampered = body.replace("EV-2018022511223320873", "EV-2018022511223320874");

    let (status, reply_body) = reply(
        app(handler.clone()),
        delivery(PLATFORM_SERIAL, &signature, tampered),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply_body.code, "ERROR");
    assert!(handler.events().is_empty());
}

#[tokio::test]
async fn unknown_serial_is_retryable_failure_when_refresh_fails() {
    let handler = RecordingHandler::new(HandlerOutcome::success());
    let transport = ScriptedTransport::new(Vec::new());
    let body = transaction_body(TRANSACTION);
    let signature = platform_signature(platform_key_next(), "notify-nonce", &body);

    let (status, _) = reply(
        app_with(handler.clone(), transport.clone()),
        delivery(PLATFORM_NEXT_SERIAL, &signature, body),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(handler.events().is_empty());
    assert_eq!(transport.calls(), fast_policy().max_attempts as usize);
}

#[tokio::test]
async fn unknown_serial_still_missing_after_refresh_is_retryable_failure() {
    let handler = RecordingHandler::new(HandlerOutcome::success());
    let transport = ScriptedTransport::new(vec![Ok(bundle_response(
        &[(PLATFORM_SERIAL, PLATFORM_CERT_PEM)],
        PLATFORM_SERIAL,
        platform_key(),
    ))]);
    let body = transaction_body(TRANSACTION);
    let signature = platform_signature(platform_key_next(), "notify-nonce", &body);

    let (status, _) = reply(
        app_with(handler.clone(), transport.clone()),
        delivery(PLATFORM_NEXT_SERIAL, &signature, body),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(handler.events().is_empty());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn resource_sealed_with_another_key_is_rejected() {
    let handler = RecordingHandler::new(HandlerOutcome::success());
    let resource = codec::encrypt_resource(
        b"vutsrqponmlkjihgfedcba9876543210",
        "fdasflkja484",
        "transaction",
        TRANSACTION.as_bytes(),
    )
    .unwrap();
    let body = serde_json::json!({
        "id": "EV-wrong-key",
        "event_type": "TRANSACTION.SUCCESS",
        "resource": resource,
    })
    .to_string();

    let (status, _) = reply(app(handler.clone()), signed_delivery(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(handler.events().is_empty());
}

#[tokio::test]
async fn empty_object_body_is_bad_request() {
    let handler = RecordingHandler::new(HandlerOutcome::success());

    let (status, _) = reply(app(handler.clone()), signed_delivery("{}".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(handler.events().is_empty());
}
