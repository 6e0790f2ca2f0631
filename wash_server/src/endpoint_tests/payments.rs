use std::sync::Arc;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use cardgate::MockGateway;
use serde_json::json;
use wash_engine::{
    db_types::{PaymentMethod, PaymentStatus, ReservationStatus, Role},
    events::EventProducers,
    PaymentsApi,
    ReservationFlowApi,
};

use super::{
    helpers::{issue_token, post_request},
    mocks::{sample_payment, sample_reservation, MockLedgerDb, MockPaymentDb},
};
use crate::payment_routes::{ConfirmPaymentRoute, CreateIntentRoute, RefundPaymentRoute};

fn configure_intent(cfg: &mut ServiceConfig) {
    let mut ledger = MockLedgerDb::new();
    ledger
        .expect_fetch_reservation()
        .returning(|id| Ok(Some(sample_reservation(id, 42, ReservationStatus::Completed, Some(7)))));
    let mut payments_db = MockPaymentDb::new();
    payments_db.expect_insert_payment().returning(|p| {
        let mut payment = sample_payment(1, PaymentStatus::Pending, PaymentMethod::Card);
        payment.processor_ref = p.processor_ref;
        payment.amount = p.amount;
        Ok(payment)
    });
    let ledger_api = ReservationFlowApi::new(ledger, EventProducers::default());
    let payments_api = PaymentsApi::new(payments_db, Arc::new(MockGateway::new()));
    cfg.service(CreateIntentRoute::<MockPaymentDb, MockLedgerDb>::new())
        .app_data(web::Data::new(ledger_api))
        .app_data(web::Data::new(payments_api));
}

#[actix_web::test]
async fn card_intents_flag_mock_mode() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(42, "Alice", Role::Customer);
    let body = json!({"reservation_id": 1});
    let (status, body) =
        post_request(&token, "/payments/create-intent", body, configure_intent).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["mock"], true, "test payments must be distinguishable from real ones");
    assert_eq!(response["payment"]["processor_ref"], "mock_pi_1");
    assert!(!response["client_secret"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn intents_for_other_peoples_reservations_are_forbidden() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(999, "Mallory", Role::Customer);
    let body = json!({"reservation_id": 1});
    let err = post_request(&token, "/payments/create-intent", body, configure_intent).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. Reservation 1 is not yours to pay for");
}

#[actix_web::test]
async fn customers_cannot_confirm_cash_payments() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let payments_api = PaymentsApi::new(MockPaymentDb::new(), Arc::new(MockGateway::new()));
        cfg.service(ConfirmPaymentRoute::<MockPaymentDb>::new()).app_data(web::Data::new(payments_api));
    }
    let token = issue_token(42, "Alice", Role::Customer);
    let err = post_request(&token, "/payments/1/confirm", json!({}), configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn washers_confirm_cash_payments() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut payments_db = MockPaymentDb::new();
        payments_db.expect_confirm_cash_payment().returning(|id, txref| {
            let mut payment = sample_payment(id, PaymentStatus::Completed, PaymentMethod::Cash);
            payment.txref = Some(txref.to_string());
            Ok(payment)
        });
        let payments_api = PaymentsApi::new(payments_db, Arc::new(MockGateway::new()));
        cfg.service(ConfirmPaymentRoute::<MockPaymentDb>::new()).app_data(web::Data::new(payments_api));
    }
    let token = issue_token(7, "Wally", Role::Washer);
    let (status, body) = post_request(&token, "/payments/1/confirm", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let payment: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payment["status"], "Completed");
    assert!(payment["txref"].as_str().unwrap().starts_with("CASH-"));
}

#[actix_web::test]
async fn refunds_from_pending_are_invalid_state() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut payments_db = MockPaymentDb::new();
        payments_db
            .expect_fetch_payment()
            .returning(|id| Ok(Some(sample_payment(id, PaymentStatus::Pending, PaymentMethod::Card))));
        // The local flip must never be attempted for a payment that is not Completed.
        payments_db.expect_refund_payment().times(0);
        let payments_api = PaymentsApi::new(payments_db, Arc::new(MockGateway::new()));
        cfg.service(RefundPaymentRoute::<MockPaymentDb>::new()).app_data(web::Data::new(payments_api));
    }
    let token = issue_token(1, "Root", Role::Admin);
    let err = post_request(&token, "/payments/1/refund", json!({}), configure).await.expect_err("Expected error");
    assert_eq!(err, "Invalid state. Payment is Pending; the requested transition is not legal from there");
}

#[actix_web::test]
async fn gateway_refusal_leaves_local_state_untouched() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut payments_db = MockPaymentDb::new();
        payments_db.expect_fetch_payment().returning(|id| {
            let mut payment = sample_payment(id, PaymentStatus::Completed, PaymentMethod::Card);
            // A reference the mock gateway never issued, so the refund call is rejected.
            payment.processor_ref = Some("pi_unknown".to_string());
            Ok(Some(payment))
        });
        payments_db.expect_refund_payment().times(0);
        let payments_api = PaymentsApi::new(payments_db, Arc::new(MockGateway::new()));
        cfg.service(RefundPaymentRoute::<MockPaymentDb>::new()).app_data(web::Data::new(payments_api));
    }
    let token = issue_token(1, "Root", Role::Admin);
    let err = post_request(&token, "/payments/1/refund", json!({}), configure).await.expect_err("Expected error");
    assert!(err.starts_with("The payment gateway failed."), "unexpected error: {err}");
}
