//! The webhook path end to end: raw body in, signature verified by middleware, reconciliation
//! applied, and an acknowledgment in the 200 range whenever the signature checks out.
use std::sync::Arc;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use cardgate::{sign_payload, MockGateway};
use wash_engine::{
    db_types::{PaymentMethod, PaymentStatus},
    PaymentError,
    PaymentsApi,
};

use super::{
    helpers::post_webhook,
    mocks::{sample_payment, MockPaymentDb},
};
use crate::payment_routes::PaymentWebhookRoute;

const WEBHOOK_SECRET: &str = "whsec_endpoint_test";
const SUCCEEDED: &[u8] = br#"{"type":"payment_intent.succeeded","data":{"intent_ref":"mock_pi_1"}}"#;

fn configure_applied(cfg: &mut ServiceConfig) {
    let mut payments_db = MockPaymentDb::new();
    payments_db.expect_complete_payment_by_ref().withf(|r, _| r == "mock_pi_1").returning(|_, txref| {
        let mut payment = sample_payment(1, PaymentStatus::Completed, PaymentMethod::Card);
        payment.txref = Some(txref.to_string());
        Ok(Some(payment))
    });
    let payments_api = PaymentsApi::new(payments_db, Arc::new(MockGateway::new()));
    cfg.service(PaymentWebhookRoute::<MockPaymentDb>::new()).app_data(web::Data::new(payments_api));
}

fn configure_untouchable(cfg: &mut ServiceConfig) {
    let mut payments_db = MockPaymentDb::new();
    // A rejected delivery must leave the reconciler completely alone.
    payments_db.expect_complete_payment_by_ref().times(0);
    payments_db.expect_fail_payment_by_ref().times(0);
    payments_db.expect_refund_payment_by_ref().times(0);
    let payments_api = PaymentsApi::new(payments_db, Arc::new(MockGateway::new()));
    cfg.service(PaymentWebhookRoute::<MockPaymentDb>::new()).app_data(web::Data::new(payments_api));
}

#[actix_web::test]
async fn valid_signature_applies_the_event() {
    let _ = env_logger::try_init().ok();
    let signature = sign_payload(WEBHOOK_SECRET, SUCCEEDED);
    let (status, body) = post_webhook(SUCCEEDED, Some(&signature), WEBHOOK_SECRET, configure_applied)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["success"], true);
}

#[actix_web::test]
async fn invalid_signature_is_rejected_without_state_change() {
    let _ = env_logger::try_init().ok();
    let err = post_webhook(SUCCEEDED, Some("00ff00ff"), WEBHOOK_SECRET, configure_untouchable)
        .await
        .expect_err("Expected error");
    assert_eq!(err, "Invalid webhook signature.");
}

#[actix_web::test]
async fn missing_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let err = post_webhook(SUCCEEDED, None, WEBHOOK_SECRET, configure_untouchable).await.expect_err("Expected error");
    assert_eq!(err, "No webhook signature found.");
}

#[actix_web::test]
async fn tampered_bodies_fail_the_signature_check() {
    let _ = env_logger::try_init().ok();
    let signature = sign_payload(WEBHOOK_SECRET, SUCCEEDED);
    let tampered = br#"{"type":"payment_intent.succeeded","data":{"intent_ref":"mock_pi_2"}}"#;
    let err =
        post_webhook(tampered, Some(&signature), WEBHOOK_SECRET, configure_untouchable).await.expect_err("Expected error");
    assert_eq!(err, "Invalid webhook signature.");
}

#[actix_web::test]
async fn unknown_references_are_acknowledged_not_errored() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut payments_db = MockPaymentDb::new();
        payments_db
            .expect_complete_payment_by_ref()
            .returning(|r, _| Err(PaymentError::UnknownProcessorRef(r.to_string())));
        let payments_api = PaymentsApi::new(payments_db, Arc::new(MockGateway::new()));
        cfg.service(PaymentWebhookRoute::<MockPaymentDb>::new()).app_data(web::Data::new(payments_api));
    }
    let signature = sign_payload(WEBHOOK_SECRET, SUCCEEDED);
    let (status, body) =
        post_webhook(SUCCEEDED, Some(&signature), WEBHOOK_SECRET, configure).await.expect("Request failed");
    // 200 so the gateway stops retrying, but flagged as a failure in the envelope.
    assert_eq!(status, StatusCode::OK);
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["success"], false);
}

#[actix_web::test]
async fn unknown_event_types_are_ignored() {
    let _ = env_logger::try_init().ok();
    let body = br#"{"type":"customer.created","data":{"intent_ref":"mock_pi_1"}}"#;
    let signature = sign_payload(WEBHOOK_SECRET, body);
    let (status, response) =
        post_webhook(body, Some(&signature), WEBHOOK_SECRET, configure_untouchable).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let ack: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(ack["success"], true);
}
