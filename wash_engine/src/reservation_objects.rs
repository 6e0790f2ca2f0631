use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use wash_common::Cents;

use crate::db_types::ReservationStatus;

//--------------------------------------  ReservationQueryFilter  ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReservationQueryFilter {
    pub customer_id: Option<i64>,
    pub washer_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<ReservationStatus>>,
}

impl ReservationQueryFilter {
    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_washer_id(mut self, washer_id: i64) -> Self {
        self.washer_id = Some(washer_id);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_status(mut self, status: ReservationStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() &&
            self.washer_id.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.status.is_none()
    }
}

//--------------------------------------  EditReservationRequest  ----------------------------------------------------
/// A full-field edit of a reservation. Edits are only legal while the reservation is still
/// `Pending`; the guard lives in the UPDATE statement itself, not in application code.
///
/// Changing the service re-snapshots `total_amount` from the new service's current price, so the
/// price change is resolved by whoever executes the edit, inside the same transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditReservationRequest {
    pub new_vehicle_id: Option<i64>,
    pub new_service_id: Option<i64>,
    pub new_scheduled_at: Option<DateTime<Utc>>,
    pub new_notes: Option<String>,
    pub new_address: Option<String>,
    pub new_latitude: Option<f64>,
    pub new_longitude: Option<f64>,
}

impl EditReservationRequest {
    pub fn is_empty(&self) -> bool {
        self.new_vehicle_id.is_none() &&
            self.new_service_id.is_none() &&
            self.new_scheduled_at.is_none() &&
            self.new_notes.is_none() &&
            self.new_address.is_none() &&
            self.new_latitude.is_none() &&
            self.new_longitude.is_none()
    }
}

//--------------------------------------      AvailableJob     -------------------------------------------------------
/// A pending, unassigned reservation enriched with the vehicle and service details a washer needs
/// to decide whether to claim it. Read-side only; carries no concurrency requirement.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AvailableJob {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    pub service_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub total_amount: Cents,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
}

//--------------------------------------   ConversationSummary  ------------------------------------------------------
/// One row per chat partner: who they are, the latest message, and how many of their messages the
/// caller has not read yet.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub partner_id: i64,
    pub partner_name: String,
    pub last_content: String,
    pub last_at: DateTime<Utc>,
    pub unread: i64,
}

//--------------------------------------    NotificationFeed    ------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationFeed {
    pub unread: i64,
    pub notifications: Vec<crate::db_types::Notification>,
}
