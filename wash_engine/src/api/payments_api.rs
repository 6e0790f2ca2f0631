use std::{fmt::Debug, sync::Arc};

use cardgate::{CardProcessor, GatewayEvent};
use log::*;
use rand::Rng;
use wash_common::Cents;

use crate::{
    db_types::{NewPayment, Payment, PaymentMethod},
    traits::{PaymentDatabase, PaymentError},
};

/// The reconciler's answer to a card-intent request. `mock` is true when the configured
/// processor fabricates payments; callers surface it so test payments are never mistaken for
/// real ones.
#[derive(Debug, Clone)]
pub struct IntentResult {
    pub payment: Payment,
    pub client_secret: String,
    pub mock: bool,
}

/// What a webhook delivery did to local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A transition was applied.
    Applied,
    /// The event had already been applied; redelivery is a no-op.
    Duplicate,
    /// The event type is not one we act on.
    Ignored,
    /// No payment carries the event's intent reference.
    UnknownReference,
}

/// `PaymentsApi` owns payment records and reconciles them against cash confirmations and the
/// card gateway's asynchronous callbacks.
pub struct PaymentsApi<B> {
    db: B,
    processor: Arc<dyn CardProcessor>,
}

impl<B> Debug for PaymentsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentsApi (mock={})", self.processor.is_mock())
    }
}

impl<B> PaymentsApi<B> {
    pub fn new(db: B, processor: Arc<dyn CardProcessor>) -> Self {
        Self { db, processor }
    }
}

/// A locally generated transaction reference for payments that never touch the processor.
fn local_txref() -> String {
    let n: u64 = rand::thread_rng().gen();
    format!("CASH-{n:016x}")
}

impl<B> PaymentsApi<B>
where B: PaymentDatabase
{
    /// Open a `Pending` cash payment against a reservation.
    pub async fn open_cash_payment(
        &self,
        reservation_id: i64,
        payer_id: i64,
        amount: Cents,
    ) -> Result<Payment, PaymentError> {
        let payment = NewPayment::cash(reservation_id, payer_id, amount);
        self.db.insert_payment(payment).await
    }

    /// Confirm a cash payment that was collected on site. `Pending → Completed`, stamping a
    /// locally generated transaction reference.
    pub async fn confirm_cash_payment(&self, payment_id: i64) -> Result<Payment, PaymentError> {
        let txref = local_txref();
        self.db.confirm_cash_payment(payment_id, &txref).await
    }

    /// Ask the processor for a payment intent and persist the `Pending` card payment carrying
    /// its reference. The processor call happens first: if it fails, no local record is created.
    pub async fn create_card_intent(
        &self,
        reservation_id: i64,
        payer_id: i64,
        amount: Cents,
    ) -> Result<IntentResult, PaymentError> {
        let metadata = format!("reservation:{reservation_id}");
        let intent = self
            .processor
            .create_intent(amount, &metadata)
            .await
            .map_err(|e| PaymentError::ProcessorError(e.to_string()))?;
        let payment = NewPayment::card(reservation_id, payer_id, amount, intent.intent_ref.clone());
        let payment = self.db.insert_payment(payment).await?;
        info!("💳️ Card intent {} opened for reservation #{reservation_id} ({amount})", intent.intent_ref);
        Ok(IntentResult { payment, client_secret: intent.client_secret, mock: self.processor.is_mock() })
    }

    /// Apply one verified webhook event from the card gateway.
    ///
    /// The event carries the processor's intent reference, not our payment id. Transitions are
    /// status-guarded in the database, so redelivery of an already-applied event reports
    /// [`WebhookOutcome::Duplicate`] rather than an error. Event types we do not recognize are
    /// ignored for forward compatibility, and unknown references are reported (not errored) so
    /// the caller can acknowledge the delivery and stop the processor's retry loop.
    pub async fn apply_gateway_event(&self, event: GatewayEvent) -> Result<WebhookOutcome, PaymentError> {
        let intent_ref = event.data.intent_ref.as_str();
        let applied = match event.event_type.as_str() {
            "payment_intent.succeeded" => {
                let txref = format!("CARD-{intent_ref}");
                self.db.complete_payment_by_ref(intent_ref, &txref).await
            },
            "payment_intent.payment_failed" => {
                let reason = event.data.reason.as_deref().unwrap_or("declined by processor");
                self.db.fail_payment_by_ref(intent_ref, reason).await
            },
            "charge.refunded" => self.db.refund_payment_by_ref(intent_ref).await,
            other => {
                debug!("💳️ Ignoring gateway event type {other}");
                return Ok(WebhookOutcome::Ignored);
            },
        };
        match applied {
            Ok(Some(payment)) => {
                info!("💳️ Gateway event {} applied to payment #{}", event.event_type, payment.id);
                Ok(WebhookOutcome::Applied)
            },
            Ok(None) => {
                debug!("💳️ Gateway event {} for {intent_ref} was already applied", event.event_type);
                Ok(WebhookOutcome::Duplicate)
            },
            Err(PaymentError::UnknownProcessorRef(r)) => {
                warn!("💳️ Gateway event {} references unknown intent {r}", event.event_type);
                Ok(WebhookOutcome::UnknownReference)
            },
            Err(e) => Err(e),
        }
    }

    /// Refund a completed payment. Card refunds are requested from the processor first; local
    /// state flips only after the processor accepts, so a gateway failure leaves the payment
    /// `Completed`.
    pub async fn refund_payment(&self, payment_id: i64) -> Result<Payment, PaymentError> {
        let payment =
            self.db.fetch_payment(payment_id).await?.ok_or(PaymentError::PaymentNotFound(payment_id))?;
        if payment.status != crate::db_types::PaymentStatus::Completed {
            return Err(PaymentError::InvalidStatus(payment.status));
        }
        if payment.method == PaymentMethod::Card {
            let intent_ref = payment.processor_ref.as_deref().ok_or(PaymentError::MissingProcessorRef)?;
            self.processor.refund(intent_ref).await.map_err(|e| PaymentError::ProcessorError(e.to_string()))?;
        }
        self.db.refund_payment(payment_id).await
    }

    pub async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, PaymentError> {
        self.db.fetch_payment(payment_id).await
    }

    pub async fn payments_for_reservation(&self, reservation_id: i64) -> Result<Vec<Payment>, PaymentError> {
        self.db.fetch_payments_for_reservation(reservation_id).await
    }

    pub fn is_mock(&self) -> bool {
        self.processor.is_mock()
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
