use thiserror::Error;

use crate::{
    db_types::{NewReservation, Notification, Rating, Reservation, ReservationStatus},
    reservation_objects::{AvailableJob, EditReservationRequest, ReservationQueryFilter},
    traits::{CatalogApiError, CatalogManagement},
};

/// The booking state machine and claim protocol.
///
/// Every transition here is a single guarded UPDATE inside one transaction: the guard clause and
/// the mutation live in the same statement, and a zero-row result means the caller lost the race
/// or the reservation is not in the required state. Backends must never implement a transition as
/// a read followed by a write.
#[allow(async_fn_in_trait)]
pub trait ReservationDatabase: CatalogManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Validate the vehicle and the service, snapshot the service price, and insert a `Pending`,
    /// unassigned reservation.
    async fn create_reservation(&self, booking: NewReservation) -> Result<Reservation, LedgerError>;

    /// Claim a pending, unassigned job for `washer_id`: `Pending → Confirmed`.
    ///
    /// The guard is `status = 'Pending' AND washer_id IS NULL`, so at most one washer ever wins.
    /// On a lost race the error distinguishes [`LedgerError::AlreadyClaimed`] from
    /// [`LedgerError::NotClaimable`]; the diagnostic read happens after the guarded write and
    /// never mutates.
    async fn claim_reservation(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError>;

    /// `Confirmed → InProgress`, stamping `started_at`. Guarded on the status and on
    /// `washer_id = washer_id` in the same statement.
    async fn start_job(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError>;

    /// `InProgress → Completed`, stamping `completed_at`.
    ///
    /// In the same transaction the washer's completed-jobs counter is incremented by exactly one
    /// and a "service completed" notification for the customer is persisted. The notification row
    /// is returned so the caller can fan it out after commit.
    async fn complete_job(&self, reservation_id: i64, washer_id: i64)
        -> Result<(Reservation, Notification), LedgerError>;

    /// `Pending | Confirmed → Cancelled`. When `acting_customer` is set, the guard additionally
    /// requires the reservation to belong to that customer (admins pass `None`).
    ///
    /// If the job was already claimed, a cancellation notification for the assigned washer is
    /// persisted in the same transaction and returned.
    async fn cancel_reservation(
        &self,
        reservation_id: i64,
        acting_customer: Option<i64>,
    ) -> Result<(Reservation, Option<Notification>), LedgerError>;

    /// Side-channel ETA update by the assigned washer; does not change status. Legal while
    /// `Confirmed` or `InProgress`. Persists a "washer on the way" notification for the customer.
    async fn update_eta(
        &self,
        reservation_id: i64,
        washer_id: i64,
        eta: chrono::DateTime<chrono::Utc>,
    ) -> Result<(Reservation, Notification), LedgerError>;

    /// Admin override with the identical guard to [`Self::claim_reservation`].
    async fn assign_washer(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError>;

    /// Full-field edit, legal only while `Pending` (the guard lives in the UPDATE). A service
    /// change re-snapshots `total_amount` from the new service's current price.
    async fn edit_reservation(
        &self,
        reservation_id: i64,
        customer_id: i64,
        edit: EditReservationRequest,
    ) -> Result<Reservation, LedgerError>;

    /// The shared pool of pending, unassigned jobs, enriched with vehicle/service details.
    async fn fetch_available_jobs(&self) -> Result<Vec<AvailableJob>, LedgerError>;

    async fn fetch_reservation(&self, reservation_id: i64) -> Result<Option<Reservation>, LedgerError>;

    async fn search_reservations(&self, filter: ReservationQueryFilter) -> Result<Vec<Reservation>, LedgerError>;

    /// Create the one-and-only rating for a completed reservation, denormalizing the washer id
    /// and recalculating the washer's running average in the same transaction.
    async fn rate_reservation(
        &self,
        reservation_id: i64,
        customer_id: i64,
        stars: i64,
        comment: Option<String>,
    ) -> Result<Rating, LedgerError>;
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested reservation {0} does not exist")]
    ReservationNotFound(i64),
    #[error("The requested service {0} does not exist or is inactive")]
    ServiceNotFound(i64),
    #[error("The requested vehicle {0} does not exist")]
    VehicleNotFound(i64),
    #[error("Vehicle {0} does not belong to the booking customer")]
    VehicleNotOwned(i64),
    #[error("Reservation {0} was claimed by another washer")]
    AlreadyClaimed(i64),
    #[error("Reservation {0} is no longer available to claim (status: {1})")]
    NotClaimable(i64, ReservationStatus),
    #[error("Operation is not legal while the reservation is {0}")]
    InvalidState(ReservationStatus),
    #[error("Caller is not the washer assigned to reservation {0}")]
    NotAssignedWasher(i64),
    #[error("Caller does not own reservation {0}")]
    NotYourReservation(i64),
    #[error("Reservation {0} has already been rated")]
    AlreadyRated(i64),
    #[error("Star rating must be between 1 and 5, got {0}")]
    InvalidStars(i64),
    #[error("The requested edit would result in a no-op")]
    EditNoOp,
    #[error("{0}")]
    CatalogError(#[from] CatalogApiError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
