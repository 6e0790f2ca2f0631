//! Washer-facing job routes: the shared pool, the claim protocol, and job execution.
use actix_web::{web, HttpResponse};
use log::*;
use wash_engine::{db_types::Role, ReservationDatabase, ReservationFlowApi};

use crate::{
    auth::JwtClaims,
    data_objects::{AvailabilityRequest, EtaRequest},
    errors::ServerError,
    route,
};

route!(available_jobs => Get "/jobs/available" impl ReservationDatabase where requires [Role::Washer]);
/// The shared pool of pending, unassigned jobs, enriched with vehicle and service details.
/// Washers re-poll this after losing a claim.
pub async fn available_jobs<B: ReservationDatabase>(
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let jobs = api.available_jobs().await?;
    Ok(HttpResponse::Ok().json(jobs))
}

route!(my_jobs => Get "/jobs/mine" impl ReservationDatabase where requires [Role::Washer]);
pub async fn my_jobs<B: ReservationDatabase>(
    claims: JwtClaims,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let jobs = api.jobs_for_washer(claims.sub).await?;
    Ok(HttpResponse::Ok().json(jobs))
}

route!(accept_job => Post "/jobs/{id}/accept" impl ReservationDatabase where requires [Role::Washer]);
/// Claim a job from the pool. At most one washer wins; losers receive a 409 and should re-poll
/// the pool. The race is settled by the database guard, not by this handler.
pub async fn accept_job<B: ReservationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("🧽️ Washer #{} attempts to claim job #{id}", claims.sub);
    let reservation = api.claim_job(id, claims.sub).await?;
    Ok(HttpResponse::Ok().json(reservation))
}

route!(start_job => Post "/jobs/{id}/start" impl ReservationDatabase where requires [Role::Washer]);
pub async fn start_job<B: ReservationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let reservation = api.start_job(id, claims.sub).await?;
    Ok(HttpResponse::Ok().json(reservation))
}

route!(complete_job => Post "/jobs/{id}/complete" impl ReservationDatabase where requires [Role::Washer]);
/// Finish a job: stamps `completed_at`, bumps the washer's completed-jobs counter and notifies
/// the customer (persisted first, then pushed).
pub async fn complete_job<B: ReservationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let reservation = api.complete_job(id, claims.sub).await?;
    info!("🧽️ Job #{id} completed by washer #{}", claims.sub);
    Ok(HttpResponse::Ok().json(reservation))
}

route!(update_eta => Put "/jobs/{id}/eta" impl ReservationDatabase where requires [Role::Washer]);
/// Side-channel ETA update; drives the "washer on the way" notification and the job-room
/// location ping without touching the status machine.
pub async fn update_eta<B: ReservationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<EtaRequest>,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let reservation = api.update_eta(id, claims.sub, body.eta).await?;
    Ok(HttpResponse::Ok().json(reservation))
}

route!(set_availability => Put "/washers/me/availability" impl ReservationDatabase where requires [Role::Washer]);
pub async fn set_availability<B: ReservationDatabase>(
    claims: JwtClaims,
    body: web::Json<AvailabilityRequest>,
    api: web::Data<ReservationFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let profile = api.set_washer_availability(claims.sub, body.available).await?;
    Ok(HttpResponse::Ok().json(profile))
}
