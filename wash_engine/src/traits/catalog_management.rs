use thiserror::Error;

use crate::db_types::{Service, UserProfile, Vehicle};

/// Read-side access to the catalog and user projections the booking flow validates against.
/// Managing these records is someone else's job; this engine only looks at them — except for the
/// washer availability flag, which washers toggle through here.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_service(&self, service_id: i64) -> Result<Option<Service>, CatalogApiError>;

    async fn fetch_vehicle(&self, vehicle_id: i64) -> Result<Option<Vehicle>, CatalogApiError>;

    async fn fetch_user_profile(&self, user_id: i64) -> Result<Option<UserProfile>, CatalogApiError>;

    /// Toggle the washer's availability flag. Returns the updated profile.
    async fn set_washer_availability(&self, washer_id: i64, available: bool) -> Result<UserProfile, CatalogApiError>;
}

#[derive(Debug, Error)]
pub enum CatalogApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested user {0} does not exist")]
    UserNotFound(i64),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}
