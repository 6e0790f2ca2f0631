//! Payment routes: the cash flow, the card-intent flow, refunds, and the gateway webhook.
use actix_web::{web, HttpRequest, HttpResponse};
use cardgate::GatewayEvent;
use log::*;
use wash_common::Cents;
use wash_engine::{
    db_types::Role,
    PaymentDatabase,
    PaymentsApi,
    ReservationDatabase,
    ReservationFlowApi,
    WebhookOutcome,
};

use crate::{
    auth::JwtClaims,
    data_objects::{CreateIntentRequest, IntentResponse, JsonResponse, NewCashPaymentRequest},
    errors::ServerError,
    route,
};

/// Fetch the reservation behind a payment request and make sure the caller may pay for it:
/// the booking customer, the assigned washer, or an admin.
async fn reservation_for_payment<B: ReservationDatabase>(
    claims: &JwtClaims,
    reservation_id: i64,
    ledger: &ReservationFlowApi<B>,
) -> Result<wash_engine::db_types::Reservation, ServerError> {
    let reservation = ledger
        .fetch_reservation(reservation_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Reservation {reservation_id}")))?;
    let allowed = match claims.role {
        Role::Admin => true,
        Role::Customer => reservation.customer_id == claims.sub,
        Role::Washer => reservation.washer_id == Some(claims.sub),
    };
    if !allowed {
        return Err(ServerError::InsufficientPermissions(format!(
            "Reservation {reservation_id} is not yours to pay for"
        )));
    }
    Ok(reservation)
}

route!(new_cash_payment => Post "/payments" impl PaymentDatabase, ReservationDatabase where requires [Role::Customer, Role::Washer]);
/// Open a `Pending` cash payment for a reservation. The washer collects the cash on site and a
/// washer or admin confirms it later.
pub async fn new_cash_payment<BPay, BRes>(
    claims: JwtClaims,
    body: web::Json<NewCashPaymentRequest>,
    payments: web::Data<PaymentsApi<BPay>>,
    ledger: web::Data<ReservationFlowApi<BRes>>,
) -> Result<HttpResponse, ServerError>
where
    BPay: PaymentDatabase,
    BRes: ReservationDatabase,
{
    let req = body.into_inner();
    let reservation = reservation_for_payment(&claims, req.reservation_id, &ledger).await?;
    let amount = req.amount.map(Cents::from).unwrap_or(reservation.total_amount);
    let payment = payments.open_cash_payment(reservation.id, claims.sub, amount).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(create_intent => Post "/payments/create-intent" impl PaymentDatabase, ReservationDatabase where requires [Role::Customer]);
/// Ask the card gateway for a payment intent over the reservation's booked total. The response
/// carries the opaque client secret and an explicit `mock` flag so callers can tell test
/// payments from real ones.
pub async fn create_intent<BPay, BRes>(
    claims: JwtClaims,
    body: web::Json<CreateIntentRequest>,
    payments: web::Data<PaymentsApi<BPay>>,
    ledger: web::Data<ReservationFlowApi<BRes>>,
) -> Result<HttpResponse, ServerError>
where
    BPay: PaymentDatabase,
    BRes: ReservationDatabase,
{
    let req = body.into_inner();
    let reservation = reservation_for_payment(&claims, req.reservation_id, &ledger).await?;
    let intent = payments.create_card_intent(reservation.id, claims.sub, reservation.total_amount).await?;
    let response =
        IntentResponse { payment: intent.payment, client_secret: intent.client_secret, mock: intent.mock };
    Ok(HttpResponse::Ok().json(response))
}

route!(confirm_payment => Post "/payments/{id}/confirm" impl PaymentDatabase where requires [Role::Washer, Role::Admin]);
/// Confirm a cash payment that was collected on site: `Pending → Completed` with a locally
/// generated transaction reference.
pub async fn confirm_payment<B: PaymentDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    payments: web::Data<PaymentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💰️ {} #{} confirms cash payment #{id}", claims.role, claims.sub);
    let payment = payments.confirm_cash_payment(id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(refund_payment => Post "/payments/{id}/refund" impl PaymentDatabase where requires [Role::Admin]);
/// Refund a completed payment. Card refunds go through the gateway first; if the gateway
/// rejects or cannot be reached, local state is left untouched and the caller sees a 502.
pub async fn refund_payment<B: PaymentDatabase>(
    path: web::Path<i64>,
    payments: web::Data<PaymentsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let payment = payments.refund_payment(id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(payment_webhook => Post "/webhook" impl PaymentDatabase);
/// The card gateway's callback endpoint. The HMAC middleware has already verified the signature
/// against the raw body by the time this handler parses it.
///
/// Webhook responses must always be in the 200 range once the signature checks out, otherwise
/// the gateway will retry the delivery forever; unknown references and redeliveries are
/// acknowledged, not errored.
pub async fn payment_webhook<B: PaymentDatabase>(
    req: HttpRequest,
    body: web::Json<GatewayEvent>,
    payments: web::Data<PaymentsApi<B>>,
) -> HttpResponse {
    trace!("💳️ Received webhook request: {}", req.uri());
    let event = body.into_inner();
    let event_type = event.event_type.clone();
    let result = match payments.apply_gateway_event(event).await {
        Ok(WebhookOutcome::Applied) => JsonResponse::success("Event processed successfully."),
        Ok(WebhookOutcome::Duplicate) => JsonResponse::success("Event already processed."),
        Ok(WebhookOutcome::Ignored) => JsonResponse::success(format!("Event type {event_type} ignored.")),
        Ok(WebhookOutcome::UnknownReference) => {
            warn!("💳️ Webhook event {event_type} referenced an intent we do not know");
            JsonResponse::failure("Unknown intent reference.")
        },
        Err(e) => {
            warn!("💳️ Unexpected error while handling gateway event {event_type}. {e}");
            JsonResponse::failure("Unexpected error handling event.")
        },
    };
    HttpResponse::Ok().json(result)
}
