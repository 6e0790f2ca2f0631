//! The claim protocol under contention: the database guard, not application logic, must pick
//! exactly one winner.
mod helpers;

use chrono::Utc;
use helpers::*;
use wash_engine::{
    db_types::{NewReservation, ReservationStatus, Role},
    LedgerError,
    ReservationDatabase,
};

#[tokio::test]
async fn n_simultaneous_claims_have_exactly_one_winner() {
    let (db, _guard) = new_test_db().await;
    let (customer, vehicle, service) = seed_basic_booking_world(&db).await;
    let reservation =
        db.create_reservation(NewReservation::new(customer, vehicle, service, Utc::now())).await.unwrap();

    let mut washers = Vec::new();
    for i in 0..8 {
        washers.push(seed_user(&db, &format!("Washer {i}"), Role::Washer).await);
    }

    let mut handles = Vec::new();
    for washer_id in washers.clone() {
        let db = db.clone();
        let reservation_id = reservation.id;
        handles.push(tokio::spawn(async move { (washer_id, db.claim_reservation(reservation_id, washer_id).await) }));
    }

    let mut winners = Vec::new();
    let mut conflicts = 0;
    for handle in handles {
        let (washer_id, result) = handle.await.unwrap();
        match result {
            Ok(r) => winners.push((washer_id, r)),
            Err(LedgerError::AlreadyClaimed(_)) => conflicts += 1,
            Err(e) => panic!("Unexpected claim error: {e}"),
        }
    }

    assert_eq!(winners.len(), 1, "exactly one washer must win the claim");
    assert_eq!(conflicts, 7, "all other claimants must observe a conflict");
    let (winner_id, claimed) = &winners[0];
    assert_eq!(claimed.washer_id, Some(*winner_id));
    assert_eq!(claimed.status, ReservationStatus::Confirmed);

    // And the row agrees with the winner.
    let stored = db.fetch_reservation(reservation.id).await.unwrap().unwrap();
    assert_eq!(stored.washer_id, Some(*winner_id));
    assert_eq!(stored.status, ReservationStatus::Confirmed);
}

#[tokio::test]
async fn claim_on_cancelled_job_is_distinguishable_from_a_lost_race() {
    let (db, _guard) = new_test_db().await;
    let (customer, vehicle, service) = seed_basic_booking_world(&db).await;
    let washer = seed_user(&db, "Washer", Role::Washer).await;

    let r = db.create_reservation(NewReservation::new(customer, vehicle, service, Utc::now())).await.unwrap();
    db.cancel_reservation(r.id, Some(customer)).await.unwrap();

    let err = db.claim_reservation(r.id, washer).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotClaimable(_, ReservationStatus::Cancelled)));

    let err = db.claim_reservation(404, washer).await.unwrap_err();
    assert!(matches!(err, LedgerError::ReservationNotFound(404)));
}

#[tokio::test]
async fn admin_assignment_uses_the_same_guard() {
    let (db, _guard) = new_test_db().await;
    let (customer, vehicle, service) = seed_basic_booking_world(&db).await;
    let washer_a = seed_user(&db, "Washer A", Role::Washer).await;
    let washer_b = seed_user(&db, "Washer B", Role::Washer).await;

    let r = db.create_reservation(NewReservation::new(customer, vehicle, service, Utc::now())).await.unwrap();
    let assigned = db.assign_washer(r.id, washer_a).await.unwrap();
    assert_eq!(assigned.washer_id, Some(washer_a));

    // Re-assignment of a claimed job is a conflict, same as a lost claim.
    let err = db.assign_washer(r.id, washer_b).await.unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyClaimed(_)));
}
