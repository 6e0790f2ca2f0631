use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, Payment, PaymentMethod},
    traits::PaymentError,
};

pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, PaymentError> {
    if payment.method == PaymentMethod::Card && payment.processor_ref.is_none() {
        return Err(PaymentError::MissingProcessorRef);
    }
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (reservation_id, payer_id, amount, method, status, processor_ref, notes)
            VALUES ($1, $2, $3, $4, 'Pending', $5, $6)
            RETURNING *;
        "#,
    )
    .bind(payment.reservation_id)
    .bind(payment.payer_id)
    .bind(payment.amount)
    .bind(payment.method.to_string())
    .bind(payment.processor_ref)
    .bind(payment.notes)
    .fetch_one(conn)
    .await?;
    debug!("💰️ Payment #{} ({}, {}) opened as Pending", payment.id, payment.method, payment.amount);
    Ok(payment)
}

pub async fn fetch_payment(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_payment_by_ref(
    processor_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE processor_ref = $1").bind(processor_ref).fetch_optional(conn).await
}

pub async fn fetch_payments_for_reservation(
    reservation_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE reservation_id = $1 ORDER BY created_at ASC")
        .bind(reservation_id)
        .fetch_all(conn)
        .await
}

/// `Pending → Completed` for a cash payment, stamping the locally generated transaction
/// reference. The status and method guards live in the statement.
pub async fn confirm_cash_payment(
    id: i64,
    txref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE payments
            SET status = 'Completed', txref = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'Pending' AND method = 'Cash'
            RETURNING *;
        "#,
    )
    .bind(txref)
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// `Pending → Completed` by processor reference. Zero rows affected means the payment is not
/// `Pending` any more — for reconciliation that is a redelivery, not an error.
pub async fn complete_payment_by_ref(
    processor_ref: &str,
    txref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE payments
            SET status = 'Completed', txref = $1, updated_at = CURRENT_TIMESTAMP
            WHERE processor_ref = $2 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(txref)
    .bind(processor_ref)
    .fetch_optional(conn)
    .await
}

/// `Pending → Failed` by processor reference, recording the reason in the notes.
pub async fn fail_payment_by_ref(
    processor_ref: &str,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE payments
            SET status = 'Failed', notes = $1, updated_at = CURRENT_TIMESTAMP
            WHERE processor_ref = $2 AND status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(reason)
    .bind(processor_ref)
    .fetch_optional(conn)
    .await
}

/// `Completed → Refunded` by processor reference.
pub async fn refund_payment_by_ref(
    processor_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE payments
            SET status = 'Refunded', updated_at = CURRENT_TIMESTAMP
            WHERE processor_ref = $1 AND status = 'Completed'
            RETURNING *;
        "#,
    )
    .bind(processor_ref)
    .fetch_optional(conn)
    .await
}

/// `Completed → Refunded` by local payment id.
pub async fn refund_payment(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE payments
            SET status = 'Refunded', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'Completed'
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}
