use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use wash_common::Cents;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(pub String);

//--------------------------------------        Role        ----------------------------------------------------------
/// The three actor roles in the system. Roles are exclusive: a user is exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Washer,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "Customer"),
            Role::Washer => write!(f, "Washer"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Customer" => Ok(Self::Customer),
            "Washer" => Ok(Self::Washer),
            "Admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Role::Customer)
    }
}

//--------------------------------------  ReservationStatus  ---------------------------------------------------------
/// The booking state machine.
///
/// `Pending → Confirmed → InProgress → Completed`, with `Cancelled` reachable from `Pending` or
/// `Confirmed` only. `Completed` and `Cancelled` are terminal. The persisted status column is the
/// single arbiter of ordering; every transition is expressed as a guarded UPDATE against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// Booked by a customer; no washer attached yet.
    Pending,
    /// A washer has claimed the job.
    Confirmed,
    /// The assigned washer has started work on site.
    InProgress,
    /// The job is done. Terminal.
    Completed,
    /// Withdrawn before work started. Terminal.
    Cancelled,
}

impl ReservationStatus {
    /// True for the states in which a washer must be attached to the reservation.
    pub fn requires_washer(&self) -> bool {
        matches!(self, Self::Confirmed | Self::InProgress | Self::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Pending => write!(f, "Pending"),
            ReservationStatus::Confirmed => write!(f, "Confirmed"),
            ReservationStatus::InProgress => write!(f, "InProgress"),
            ReservationStatus::Completed => write!(f, "Completed"),
            ReservationStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "InProgress" => Ok(Self::InProgress),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid reservation status: {s}"))),
        }
    }
}

impl From<String> for ReservationStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            log::error!("Invalid reservation status in database: {value}. Defaulting to Pending");
            ReservationStatus::Pending
        })
    }
}

//--------------------------------------     Reservation     ---------------------------------------------------------
/// A single booked wash service. "Job" is the washer-facing name for the same record.
///
/// Invariant: `washer_id` is non-null if and only if the status requires a washer
/// ([`ReservationStatus::requires_washer`]). Reservations are never deleted; cancellation is a
/// terminal status, not removal.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub customer_id: i64,
    pub vehicle_id: i64,
    pub service_id: i64,
    pub washer_id: Option<i64>,
    pub status: ReservationStatus,
    pub scheduled_at: DateTime<Utc>,
    /// Snapshot of the service price at booking time, never recomputed from the catalog.
    pub total_amount: Cents,
    pub notes: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub eta: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    NewReservation   ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub customer_id: i64,
    pub vehicle_id: i64,
    pub service_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NewReservation {
    pub fn new(customer_id: i64, vehicle_id: i64, service_id: i64, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            customer_id,
            vehicle_id,
            service_id,
            scheduled_at,
            notes: None,
            address: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_address<S: Into<String>>(mut self, address: S) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::Card => write!(f, "Card"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(Self::Cash),
            "Card" => Ok(Self::Card),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

impl From<String> for PaymentMethod {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(PaymentMethod::Cash)
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(PaymentStatus::Pending)
    }
}

//--------------------------------------       Payment       ---------------------------------------------------------
/// A payment against a reservation. Mutated only by the payment reconciler; never deleted.
///
/// A `Card` payment always carries the processor's intent reference from the moment it is
/// created. `txref` is our own transaction reference, stamped when the payment completes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub reservation_id: i64,
    pub payer_id: i64,
    pub amount: Cents,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub processor_ref: Option<String>,
    pub txref: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub reservation_id: i64,
    pub payer_id: i64,
    pub amount: Cents,
    pub method: PaymentMethod,
    pub processor_ref: Option<String>,
    pub notes: Option<String>,
}

impl NewPayment {
    pub fn cash(reservation_id: i64, payer_id: i64, amount: Cents) -> Self {
        Self { reservation_id, payer_id, amount, method: PaymentMethod::Cash, processor_ref: None, notes: None }
    }

    pub fn card(reservation_id: i64, payer_id: i64, amount: Cents, processor_ref: String) -> Self {
        Self {
            reservation_id,
            payer_id,
            amount,
            method: PaymentMethod::Card,
            processor_ref: Some(processor_ref),
            notes: None,
        }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

//--------------------------------------       Rating        ---------------------------------------------------------
/// One-to-one with a completed reservation. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub reservation_id: i64,
    pub customer_id: i64,
    /// Denormalized from the reservation at creation time.
    pub washer_id: i64,
    pub stars: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------    Notification     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    /// Free-form type tag, e.g. "job_completed", "washer_on_the_way".
    pub kind: String,
    pub read: bool,
    pub action_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub action_url: Option<String>,
}

impl NewNotification {
    pub fn new<T: Into<String>, B: Into<String>, K: Into<String>>(user_id: i64, title: T, body: B, kind: K) -> Self {
        Self { user_id, title: title.into(), body: body.into(), kind: kind.into(), action_url: None }
    }

    pub fn with_action_url<S: Into<String>>(mut self, url: S) -> Self {
        self.action_url = Some(url.into());
        self
    }
}

//--------------------------------------       Message       ---------------------------------------------------------
/// A direct message between two users. Content is immutable; the read flag flips exactly once.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub sender_role: Role,
    pub receiver_id: i64,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub sender_role: Role,
    pub receiver_id: i64,
    pub content: String,
}

//--------------------------------------   User projection   ---------------------------------------------------------
/// The slice of the user aggregate this engine owns: the washer's availability flag, running
/// rating, and completed-jobs counter. Everything else about users belongs to the account system.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub role: Role,
    pub available: bool,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub completed_jobs: i64,
}

//--------------------------------------       Catalog       ---------------------------------------------------------
/// Catalog records exist to validate bookings and snapshot prices; their management is out of
/// scope for this engine.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Cents,
    pub active: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub owner_id: i64,
    pub make: String,
    pub model: String,
    pub plate: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for s in
            [ReservationStatus::Pending, ReservationStatus::Confirmed, ReservationStatus::InProgress, ReservationStatus::Completed, ReservationStatus::Cancelled]
        {
            assert_eq!(s.to_string().parse::<ReservationStatus>().unwrap(), s);
        }
        assert!("Paused".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn washer_requirement_follows_status() {
        assert!(!ReservationStatus::Pending.requires_washer());
        assert!(ReservationStatus::Confirmed.requires_washer());
        assert!(ReservationStatus::InProgress.requires_washer());
        assert!(ReservationStatus::Completed.requires_washer());
        assert!(!ReservationStatus::Cancelled.requires_washer());
    }

    #[test]
    fn terminal_states() {
        assert!(ReservationStatus::Completed.is_terminal());
        assert!(ReservationStatus::Cancelled.is_terminal());
        assert!(!ReservationStatus::Confirmed.is_terminal());
    }
}
