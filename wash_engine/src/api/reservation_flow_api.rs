use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{NewReservation, Rating, Reservation},
    events::{EventProducers, LocationEvent, NotificationEvent},
    reservation_objects::{AvailableJob, EditReservationRequest, ReservationQueryFilter},
    traits::{LedgerError, ReservationDatabase},
};

/// `ReservationFlowApi` drives the booking lifecycle: create, claim, start, complete, cancel,
/// edit, ETA updates and ratings, together with their notification side effects.
pub struct ReservationFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReservationFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReservationFlowApi")
    }
}

impl<B> ReservationFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ReservationFlowApi<B>
where B: ReservationDatabase
{
    async fn publish_notification(&self, event: NotificationEvent) {
        for producer in &self.producers.notification_producers {
            producer.publish_event(event.clone()).await;
        }
    }

    /// Book a new wash: validates the vehicle and service, snapshots the price, and inserts a
    /// `Pending`, unassigned reservation.
    pub async fn create_reservation(&self, booking: NewReservation) -> Result<Reservation, LedgerError> {
        let reservation = self.db.create_reservation(booking).await?;
        debug!("🗓️ Reservation #{} accepted", reservation.id);
        Ok(reservation)
    }

    /// A washer claims a job from the shared pool. At most one washer ever wins; losers get
    /// [`LedgerError::AlreadyClaimed`] or [`LedgerError::NotClaimable`] and should re-poll.
    pub async fn claim_job(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError> {
        let reservation = self.db.claim_reservation(reservation_id, washer_id).await?;
        info!("🧽️ Washer #{washer_id} won the claim on job #{reservation_id}");
        Ok(reservation)
    }

    /// Admin override: attach a washer to a pending job without the washer asking for it. The
    /// same guard as [`Self::claim_job`] applies.
    pub async fn assign_job(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError> {
        let reservation = self.db.assign_washer(reservation_id, washer_id).await?;
        info!("🗓️ Admin assigned washer #{washer_id} to job #{reservation_id}");
        Ok(reservation)
    }

    pub async fn start_job(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError> {
        self.db.start_job(reservation_id, washer_id).await
    }

    /// Complete a job. The backend increments the washer's counter and persists the customer
    /// notification in the same transaction; the live push happens here, after commit.
    pub async fn complete_job(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError> {
        let (reservation, notification) = self.db.complete_job(reservation_id, washer_id).await?;
        self.publish_notification(NotificationEvent::new(notification)).await;
        Ok(reservation)
    }

    pub async fn cancel_reservation(
        &self,
        reservation_id: i64,
        acting_customer: Option<i64>,
    ) -> Result<Reservation, LedgerError> {
        let (reservation, notification) = self.db.cancel_reservation(reservation_id, acting_customer).await?;
        if let Some(notification) = notification {
            self.publish_notification(NotificationEvent::new(notification)).await;
        }
        Ok(reservation)
    }

    /// Side-channel ETA update. Persists the "washer on the way" notification and then pushes
    /// both the notification (customer's private room) and a location ping (job room).
    pub async fn update_eta(
        &self,
        reservation_id: i64,
        washer_id: i64,
        eta: DateTime<Utc>,
    ) -> Result<Reservation, LedgerError> {
        let (reservation, notification) = self.db.update_eta(reservation_id, washer_id, eta).await?;
        self.publish_notification(NotificationEvent::new(notification)).await;
        let ping = LocationEvent {
            reservation_id,
            washer_id,
            eta,
            latitude: reservation.latitude,
            longitude: reservation.longitude,
        };
        for producer in &self.producers.location_producers {
            producer.publish_event(ping.clone()).await;
        }
        Ok(reservation)
    }

    /// Full-field edit, legal only while the reservation is still `Pending`.
    pub async fn edit_reservation(
        &self,
        reservation_id: i64,
        customer_id: i64,
        edit: EditReservationRequest,
    ) -> Result<Reservation, LedgerError> {
        self.db.edit_reservation(reservation_id, customer_id, edit).await
    }

    pub async fn available_jobs(&self) -> Result<Vec<AvailableJob>, LedgerError> {
        self.db.fetch_available_jobs().await
    }

    pub async fn fetch_reservation(&self, reservation_id: i64) -> Result<Option<Reservation>, LedgerError> {
        self.db.fetch_reservation(reservation_id).await
    }

    pub async fn reservations_for_customer(&self, customer_id: i64) -> Result<Vec<Reservation>, LedgerError> {
        self.db.search_reservations(ReservationQueryFilter::default().with_customer_id(customer_id)).await
    }

    pub async fn jobs_for_washer(&self, washer_id: i64) -> Result<Vec<Reservation>, LedgerError> {
        self.db.search_reservations(ReservationQueryFilter::default().with_washer_id(washer_id)).await
    }

    pub async fn rate_reservation(
        &self,
        reservation_id: i64,
        customer_id: i64,
        stars: i64,
        comment: Option<String>,
    ) -> Result<Rating, LedgerError> {
        self.db.rate_reservation(reservation_id, customer_id, stars, comment).await
    }

    /// Toggle the washer's availability flag in the user projection.
    pub async fn set_washer_availability(
        &self,
        washer_id: i64,
        available: bool,
    ) -> Result<crate::db_types::UserProfile, LedgerError> {
        Ok(self.db.set_washer_availability(washer_id, available).await?)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
