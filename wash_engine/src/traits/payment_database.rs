use thiserror::Error;

use crate::db_types::{NewPayment, Payment, PaymentStatus};

/// Payment records and the reconciliation state machine.
///
/// `Pending → Completed | Failed`, `Completed → Refunded`. Each transition is a status-guarded
/// UPDATE, which is what makes webhook redelivery idempotent: a duplicate "succeeded" event finds
/// zero rows to update and the backend reports the no-op instead of an error.
#[allow(async_fn_in_trait)]
pub trait PaymentDatabase {
    /// Insert a new `Pending` payment (cash record or card intent).
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentError>;

    /// `Pending → Completed` for a cash payment, stamping the locally generated transaction
    /// reference.
    async fn confirm_cash_payment(&self, payment_id: i64, txref: &str) -> Result<Payment, PaymentError>;

    /// `Pending → Completed` looked up by the processor's intent reference. Returns
    /// `Ok(None)` when the payment is already `Completed` (duplicate delivery).
    async fn complete_payment_by_ref(&self, processor_ref: &str, txref: &str)
        -> Result<Option<Payment>, PaymentError>;

    /// `Pending → Failed` looked up by the processor's intent reference, recording the failure
    /// reason in the notes. Duplicate delivery is a no-op.
    async fn fail_payment_by_ref(&self, processor_ref: &str, reason: &str) -> Result<Option<Payment>, PaymentError>;

    /// `Completed → Refunded` looked up by the processor's intent reference. Duplicate delivery
    /// is a no-op.
    async fn refund_payment_by_ref(&self, processor_ref: &str) -> Result<Option<Payment>, PaymentError>;

    /// `Completed → Refunded` by local payment id (the operator-initiated path).
    async fn refund_payment(&self, payment_id: i64) -> Result<Payment, PaymentError>;

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, PaymentError>;

    async fn fetch_payment_by_ref(&self, processor_ref: &str) -> Result<Option<Payment>, PaymentError>;

    async fn fetch_payments_for_reservation(&self, reservation_id: i64) -> Result<Vec<Payment>, PaymentError>;
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("No payment carries processor reference {0}")]
    UnknownProcessorRef(String),
    #[error("Payment is {0}; the requested transition is not legal from there")]
    InvalidStatus(PaymentStatus),
    #[error("The reservation for this payment does not exist")]
    ReservationNotFound(i64),
    #[error("A card payment requires a processor reference")]
    MissingProcessorRef,
    #[error("The payment gateway rejected the request: {0}")]
    ProcessorError(String),
}

impl From<sqlx::Error> for PaymentError {
    fn from(e: sqlx::Error) -> Self {
        PaymentError::DatabaseError(e.to_string())
    }
}
