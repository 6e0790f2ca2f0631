use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, SqliteConnection};
use wash_common::Cents;

use crate::{
    db_types::{NewReservation, Reservation},
    reservation_objects::{AvailableJob, EditReservationRequest, ReservationQueryFilter},
    traits::LedgerError,
};

/// Insert a new `Pending`, unassigned reservation carrying the given price snapshot. Vehicle and
/// service validation is the caller's responsibility (it happens inside the same transaction).
pub async fn insert_reservation(
    booking: NewReservation,
    price: Cents,
    conn: &mut SqliteConnection,
) -> Result<Reservation, LedgerError> {
    let reservation = sqlx::query_as(
        r#"
            INSERT INTO reservations (
                customer_id,
                vehicle_id,
                service_id,
                status,
                scheduled_at,
                total_amount,
                notes,
                address,
                latitude,
                longitude
            ) VALUES ($1, $2, $3, 'Pending', $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(booking.customer_id)
    .bind(booking.vehicle_id)
    .bind(booking.service_id)
    .bind(booking.scheduled_at)
    .bind(price)
    .bind(booking.notes)
    .bind(booking.address)
    .bind(booking.latitude)
    .bind(booking.longitude)
    .fetch_one(conn)
    .await?;
    Ok(reservation)
}

pub async fn fetch_reservation(id: i64, conn: &mut SqliteConnection) -> Result<Option<Reservation>, sqlx::Error> {
    let reservation =
        sqlx::query_as("SELECT * FROM reservations WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(reservation)
}

/// The claim compare-and-swap: `Pending → Confirmed`, attaching the washer.
///
/// The guard (`status = 'Pending' AND washer_id IS NULL`) is part of the UPDATE statement, so the
/// database resolves concurrent claims; a `None` result means the caller lost. Call
/// [`classify_claim_loss`] afterwards to turn the loss into a precise error.
pub async fn claim_reservation(
    id: i64,
    washer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Reservation>, sqlx::Error> {
    let reservation: Option<Reservation> = sqlx::query_as(
        r#"
            UPDATE reservations
            SET washer_id = $1, status = 'Confirmed', updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'Pending' AND washer_id IS NULL
            RETURNING *;
        "#,
    )
    .bind(washer_id)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    if let Some(r) = &reservation {
        debug!("🧽️ Job #{id} claimed by washer #{washer_id} ({})", r.total_amount);
    }
    Ok(reservation)
}

/// Diagnostic read for a lost claim. Never mutates; the guarded UPDATE above already decided the
/// outcome, this only names it for the caller.
pub async fn classify_claim_loss(id: i64, conn: &mut SqliteConnection) -> Result<LedgerError, sqlx::Error> {
    let error = match fetch_reservation(id, conn).await? {
        None => LedgerError::ReservationNotFound(id),
        Some(r) if r.washer_id.is_some() => LedgerError::AlreadyClaimed(id),
        Some(r) => LedgerError::NotClaimable(id, r.status),
    };
    Ok(error)
}

/// `Confirmed → InProgress` for the assigned washer, stamping `started_at`.
pub async fn start_job(
    id: i64,
    washer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Reservation>, sqlx::Error> {
    let reservation = sqlx::query_as(
        r#"
            UPDATE reservations
            SET status = 'InProgress', started_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'Confirmed' AND washer_id = $2
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(washer_id)
    .fetch_optional(conn)
    .await?;
    Ok(reservation)
}

/// `InProgress → Completed` for the assigned washer, stamping `completed_at`. The counter and
/// notification side effects are composed around this call by the backend, inside the same
/// transaction.
pub async fn complete_job(
    id: i64,
    washer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Reservation>, sqlx::Error> {
    let reservation = sqlx::query_as(
        r#"
            UPDATE reservations
            SET status = 'Completed', completed_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'InProgress' AND washer_id = $2
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(washer_id)
    .fetch_optional(conn)
    .await?;
    Ok(reservation)
}

/// Explain why a washer-guarded transition found no row to update.
pub async fn classify_washer_loss(
    id: i64,
    washer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<LedgerError, sqlx::Error> {
    let error = match fetch_reservation(id, conn).await? {
        None => LedgerError::ReservationNotFound(id),
        Some(r) if r.washer_id != Some(washer_id) => LedgerError::NotAssignedWasher(id),
        Some(r) => LedgerError::InvalidState(r.status),
    };
    Ok(error)
}

/// `Pending | Confirmed → Cancelled`. With `acting_customer` set, the row must also belong to
/// that customer; admins pass `None` and may cancel any cancellable reservation.
///
/// The status swap is the single guarded statement that decides the outcome. A second statement
/// then detaches the washer (a cancelled reservation must not carry one); callers run both inside
/// one transaction. The previously assigned washer, if any, is returned alongside so the caller
/// can notify them.
pub async fn cancel_reservation(
    id: i64,
    acting_customer: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Option<(Reservation, Option<i64>)>, sqlx::Error> {
    let reservation: Option<Reservation> = match acting_customer {
        Some(customer_id) => {
            sqlx::query_as(
                r#"
                    UPDATE reservations
                    SET status = 'Cancelled', updated_at = CURRENT_TIMESTAMP
                    WHERE id = $1 AND status IN ('Pending', 'Confirmed') AND customer_id = $2
                    RETURNING *;
                "#,
            )
            .bind(id)
            .bind(customer_id)
            .fetch_optional(&mut *conn)
            .await?
        },
        None => {
            sqlx::query_as(
                r#"
                    UPDATE reservations
                    SET status = 'Cancelled', updated_at = CURRENT_TIMESTAMP
                    WHERE id = $1 AND status IN ('Pending', 'Confirmed')
                    RETURNING *;
                "#,
            )
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
        },
    };
    let Some(mut reservation) = reservation else {
        return Ok(None);
    };
    let prev_washer = reservation.washer_id.take();
    if prev_washer.is_some() {
        sqlx::query("UPDATE reservations SET washer_id = NULL WHERE id = $1").bind(id).execute(conn).await?;
    }
    Ok(Some((reservation, prev_washer)))
}

pub async fn classify_cancel_loss(
    id: i64,
    acting_customer: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<LedgerError, sqlx::Error> {
    let error = match fetch_reservation(id, conn).await? {
        None => LedgerError::ReservationNotFound(id),
        Some(r) if acting_customer.is_some() && Some(r.customer_id) != acting_customer => {
            LedgerError::NotYourReservation(id)
        },
        Some(r) => LedgerError::InvalidState(r.status),
    };
    Ok(error)
}

/// Stamp the washer's estimated arrival time. Status is untouched; legal while the job is claimed
/// but not finished.
pub async fn set_eta(
    id: i64,
    washer_id: i64,
    eta: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Reservation>, sqlx::Error> {
    let reservation = sqlx::query_as(
        r#"
            UPDATE reservations
            SET eta = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status IN ('Confirmed', 'InProgress') AND washer_id = $3
            RETURNING *;
        "#,
    )
    .bind(eta)
    .bind(id)
    .bind(washer_id)
    .fetch_optional(conn)
    .await?;
    Ok(reservation)
}

/// Full-field edit of a `Pending` reservation owned by `customer_id`. The `Pending` guard and the
/// ownership check are both part of the UPDATE. When the service changed, the caller passes the
/// re-snapshotted price in `new_total`.
pub async fn edit_reservation(
    id: i64,
    customer_id: i64,
    edit: EditReservationRequest,
    new_total: Option<Cents>,
    conn: &mut SqliteConnection,
) -> Result<Option<Reservation>, LedgerError> {
    if edit.is_empty() {
        debug!("📝️ No fields to update for reservation {id}. Update request skipped.");
        return Err(LedgerError::EditNoOp);
    }
    let mut builder = QueryBuilder::new("UPDATE reservations SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(vehicle_id) = edit.new_vehicle_id {
        set_clause.push("vehicle_id = ");
        set_clause.push_bind_unseparated(vehicle_id);
    }
    if let Some(service_id) = edit.new_service_id {
        set_clause.push("service_id = ");
        set_clause.push_bind_unseparated(service_id);
    }
    if let Some(total) = new_total {
        set_clause.push("total_amount = ");
        set_clause.push_bind_unseparated(total);
    }
    if let Some(scheduled_at) = edit.new_scheduled_at {
        set_clause.push("scheduled_at = ");
        set_clause.push_bind_unseparated(scheduled_at);
    }
    if let Some(notes) = edit.new_notes {
        set_clause.push("notes = ");
        set_clause.push_bind_unseparated(notes);
    }
    if let Some(address) = edit.new_address {
        set_clause.push("address = ");
        set_clause.push_bind_unseparated(address);
    }
    if let Some(latitude) = edit.new_latitude {
        set_clause.push("latitude = ");
        set_clause.push_bind_unseparated(latitude);
    }
    if let Some(longitude) = edit.new_longitude {
        set_clause.push("longitude = ");
        set_clause.push_bind_unseparated(longitude);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND status = 'Pending' AND customer_id = ");
    builder.push_bind(customer_id);
    builder.push(" RETURNING *");
    trace!("📝️ Executing query: {}", builder.sql());
    let res = builder
        .build()
        .fetch_optional(conn)
        .await?
        .map(|row: SqliteRow| Reservation::from_row(&row))
        .transpose()?;
    Ok(res)
}

pub async fn classify_edit_loss(
    id: i64,
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<LedgerError, sqlx::Error> {
    let error = match fetch_reservation(id, conn).await? {
        None => LedgerError::ReservationNotFound(id),
        Some(r) if r.customer_id != customer_id => LedgerError::NotYourReservation(id),
        Some(r) => LedgerError::InvalidState(r.status),
    };
    Ok(error)
}

/// The shared washer-facing pool: every `Pending`, unassigned reservation joined with the
/// customer, vehicle and service details. Read-side only.
pub async fn fetch_available_jobs(conn: &mut SqliteConnection) -> Result<Vec<AvailableJob>, sqlx::Error> {
    let jobs = sqlx::query_as(
        r#"
        SELECT
            r.id            AS id,
            r.customer_id   AS customer_id,
            u.name          AS customer_name,
            v.make          AS vehicle_make,
            v.model         AS vehicle_model,
            v.plate         AS vehicle_plate,
            s.name          AS service_name,
            r.scheduled_at  AS scheduled_at,
            r.total_amount  AS total_amount,
            r.address       AS address,
            r.latitude      AS latitude,
            r.longitude     AS longitude,
            r.notes         AS notes
        FROM reservations r
        JOIN users u ON u.id = r.customer_id
        JOIN vehicles v ON v.id = r.vehicle_id
        JOIN services s ON s.id = r.service_id
        WHERE r.status = 'Pending' AND r.washer_id IS NULL
        ORDER BY r.scheduled_at ASC
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(jobs)
}

/// Fetches reservations according to the criteria in the filter, ordered by `scheduled_at`.
pub async fn search_reservations(
    filter: ReservationQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Reservation>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM reservations ");
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(customer_id) = filter.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id);
    }
    if let Some(washer_id) = filter.washer_id {
        where_clause.push("washer_id = ");
        where_clause.push_bind_unseparated(washer_id);
    }
    if filter.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses =
            filter.status.as_ref().unwrap().iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    if let Some(since) = filter.since {
        where_clause.push("scheduled_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = filter.until {
        where_clause.push("scheduled_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY scheduled_at ASC");
    trace!("📝️ Executing query: {}", builder.sql());
    let reservations = builder.build_query_as::<Reservation>().fetch_all(conn).await?;
    Ok(reservations)
}
