use actix_web::{http::StatusCode, web, web::ServiceConfig};
use log::debug;
use serde_json::json;
use wash_engine::{
    db_types::{ReservationStatus, Role},
    events::EventProducers,
    LedgerError,
    ReservationFlowApi,
};

use super::{
    helpers::{get_request, issue_expired_token, issue_token, post_request, put_request},
    mocks::{sample_reservation, MockLedgerDb},
};
use crate::routes::{
    CancelReservationRoute,
    MyReservationsRoute,
    NewReservationRoute,
    UpdateReservationRoute,
};

fn configure_create(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_create_reservation()
        .returning(|booking| Ok(sample_reservation(1, booking.customer_id, ReservationStatus::Pending, None)));
    let api = ReservationFlowApi::new(db, EventProducers::default());
    cfg.service(NewReservationRoute::<MockLedgerDb>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn create_reservation_as_customer() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(42, "Alice", Role::Customer);
    let body = json!({"vehicle_id": 1, "service_id": 1, "scheduled_at": "2024-07-01T10:00:00Z"});
    let (status, body) = post_request(&token, "/reservations", body, configure_create).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let reservation: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(reservation["status"], "Pending");
    assert_eq!(reservation["customer_id"], 42);
    assert!(reservation["washer_id"].is_null());
}

#[actix_web::test]
async fn create_reservation_without_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({"vehicle_id": 1, "service_id": 1, "scheduled_at": "2024-07-01T10:00:00Z"});
    let err = post_request("", "/reservations", body, configure_create).await.expect_err("Expected error");
    assert_eq!(err, "Authentication Error. No bearer token was provided.");
}

#[actix_web::test]
async fn create_reservation_with_expired_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_expired_token(42, "Alice", Role::Customer);
    let body = json!({"vehicle_id": 1, "service_id": 1, "scheduled_at": "2024-07-01T10:00:00Z"});
    let err = post_request(&token, "/reservations", body, configure_create).await.expect_err("Expected error");
    assert_eq!(err, "Authentication Error. Login token has expired.");
}

#[actix_web::test]
async fn create_reservation_as_washer_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(7, "Wally", Role::Washer);
    let body = json!({"vehicle_id": 1, "service_id": 1, "scheduled_at": "2024-07-01T10:00:00Z"});
    let err = post_request(&token, "/reservations", body, configure_create).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn my_reservations_lists_only_mine() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockLedgerDb::new();
        db.expect_search_reservations()
            .withf(|filter| filter.customer_id == Some(42))
            .returning(|_| Ok(vec![sample_reservation(1, 42, ReservationStatus::Pending, None)]));
        let api = ReservationFlowApi::new(db, EventProducers::default());
        cfg.service(MyReservationsRoute::<MockLedgerDb>::new()).app_data(web::Data::new(api));
    }
    let token = issue_token(42, "Alice", Role::Customer);
    let (status, body) = get_request(&token, "/reservations", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let list: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn edits_are_rejected_once_claimed() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockLedgerDb::new();
        db.expect_edit_reservation()
            .returning(|_, _, _| Err(LedgerError::InvalidState(ReservationStatus::Confirmed)));
        let api = ReservationFlowApi::new(db, EventProducers::default());
        cfg.service(UpdateReservationRoute::<MockLedgerDb>::new()).app_data(web::Data::new(api));
    }
    let token = issue_token(42, "Alice", Role::Customer);
    let body = json!({"new_notes": "too late"});
    debug!("Calling PUT /reservations/1 on a confirmed reservation");
    let err = put_request(&token, "/reservations/1", body, configure).await.expect_err("Expected error");
    assert_eq!(err, "Invalid state. Operation is not legal while the reservation is Confirmed");
}

#[actix_web::test]
async fn admins_cancel_on_behalf_of_anyone() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockLedgerDb::new();
        // The admin path must not restrict the cancellation to an owning customer.
        db.expect_cancel_reservation()
            .withf(|id, acting_customer| *id == 5 && acting_customer.is_none())
            .returning(|id, _| Ok((sample_reservation(id, 42, ReservationStatus::Cancelled, None), None)));
        let api = ReservationFlowApi::new(db, EventProducers::default());
        cfg.service(CancelReservationRoute::<MockLedgerDb>::new()).app_data(web::Data::new(api));
    }
    let token = issue_token(1, "Root", Role::Admin);
    let (status, body) =
        post_request(&token, "/reservations/5/cancel", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let reservation: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(reservation["status"], "Cancelled");
}
