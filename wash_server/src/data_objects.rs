use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wash_engine::db_types::Payment;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: std::fmt::Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: std::fmt::Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservationRequest {
    pub vehicle_id: i64,
    pub service_id: i64,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRequest {
    pub washer_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtaRequest {
    pub eta: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRequest {
    pub stars: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCashPaymentRequest {
    pub reservation_id: i64,
    /// Amount in cents. Defaults to the reservation's booked total when omitted.
    #[serde(default)]
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIntentRequest {
    pub reservation_id: i64,
}

/// The card-intent response. `mock` is true when no processor credentials are configured and the
/// intent was fabricated locally; callers must not treat such payments as real.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentResponse {
    pub payment: Payment,
    pub client_secret: String,
    pub mock: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}
