use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::json;
use wash_engine::{
    db_types::{ReservationStatus, Role},
    events::EventProducers,
    LedgerError,
    ReservationFlowApi,
};

use super::{
    helpers::{get_request, issue_token, post_request},
    mocks::{sample_reservation, MockLedgerDb},
};
use crate::job_routes::{AcceptJobRoute, AvailableJobsRoute, StartJobRoute};

fn configure_pool(cfg: &mut ServiceConfig) {
    let mut db = MockLedgerDb::new();
    db.expect_fetch_available_jobs().returning(|| Ok(vec![]));
    let api = ReservationFlowApi::new(db, EventProducers::default());
    cfg.service(AvailableJobsRoute::<MockLedgerDb>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn job_pool_is_washer_only() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(42, "Alice", Role::Customer);
    let err = get_request(&token, "/jobs/available", configure_pool).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");

    let token = issue_token(7, "Wally", Role::Washer);
    let (status, body) = get_request(&token, "/jobs/available", configure_pool).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn accepting_a_job_attaches_the_caller() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockLedgerDb::new();
        db.expect_claim_reservation()
            .withf(|id, washer| *id == 3 && *washer == 7)
            .returning(|id, washer| Ok(sample_reservation(id, 42, ReservationStatus::Confirmed, Some(washer))));
        let api = ReservationFlowApi::new(db, EventProducers::default());
        cfg.service(AcceptJobRoute::<MockLedgerDb>::new()).app_data(web::Data::new(api));
    }
    let token = issue_token(7, "Wally", Role::Washer);
    let (status, body) = post_request(&token, "/jobs/3/accept", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let reservation: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(reservation["washer_id"], 7);
    assert_eq!(reservation["status"], "Confirmed");
}

#[actix_web::test]
async fn losing_the_claim_race_reads_as_a_conflict() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockLedgerDb::new();
        db.expect_claim_reservation().returning(|id, _| Err(LedgerError::AlreadyClaimed(id)));
        let api = ReservationFlowApi::new(db, EventProducers::default());
        cfg.service(AcceptJobRoute::<MockLedgerDb>::new()).app_data(web::Data::new(api));
    }
    let token = issue_token(7, "Wally", Role::Washer);
    let err = post_request(&token, "/jobs/3/accept", json!({}), configure).await.expect_err("Expected error");
    assert_eq!(err, "Conflict. Reservation 3 was claimed by another washer");
}

#[actix_web::test]
async fn only_the_assigned_washer_may_start() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut db = MockLedgerDb::new();
        db.expect_start_job().returning(|id, _| Err(LedgerError::NotAssignedWasher(id)));
        let api = ReservationFlowApi::new(db, EventProducers::default());
        cfg.service(StartJobRoute::<MockLedgerDb>::new()).app_data(web::Data::new(api));
    }
    let token = issue_token(8, "Other washer", Role::Washer);
    let err = post_request(&token, "/jobs/3/start", json!({}), configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient Permissions. Caller is not the washer assigned to reservation 3");
}
