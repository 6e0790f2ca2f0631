//! `SqliteDatabase` is the concrete SQLite backend for the wash engine.
//!
//! Every mutating operation is a single transaction; the guarded statement inside it decides
//! wins and losses, and the diagnostic reads that name a loss happen after the guard, never
//! before a write.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{catalog, db_url, messages, new_pool, notifications, payments, ratings, reservations, users};
use crate::{
    db_types::{
        Message,
        NewMessage,
        NewNotification,
        NewPayment,
        NewReservation,
        Notification,
        Payment,
        Rating,
        Reservation,
        Service,
        UserProfile,
        Vehicle,
    },
    reservation_objects::{
        AvailableJob,
        ConversationSummary,
        EditReservationRequest,
        NotificationFeed,
        ReservationQueryFilter,
    },
    traits::{
        CatalogApiError,
        CatalogManagement,
        LedgerError,
        MessagingDatabase,
        MessagingError,
        PaymentDatabase,
        PaymentError,
        ReservationDatabase,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connect to the database at `WASH_DATABASE_URL` (or the default path) and run migrations.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_service(&self, service_id: i64) -> Result<Option<Service>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_service(service_id, &mut conn).await?)
    }

    async fn fetch_vehicle(&self, vehicle_id: i64) -> Result<Option<Vehicle>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_vehicle(vehicle_id, &mut conn).await?)
    }

    async fn fetch_user_profile(&self, user_id: i64) -> Result<Option<UserProfile>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user_profile(user_id, &mut conn).await?)
    }

    async fn set_washer_availability(&self, washer_id: i64, available: bool) -> Result<UserProfile, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let profile = users::set_availability(washer_id, available, &mut conn)
            .await?
            .ok_or(CatalogApiError::UserNotFound(washer_id))?;
        debug!("🧽️ Washer #{washer_id} is now {}", if available { "available" } else { "unavailable" });
        Ok(profile)
    }
}

impl ReservationDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_reservation(&self, booking: NewReservation) -> Result<Reservation, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let service = catalog::fetch_service(booking.service_id, &mut tx)
            .await?
            .filter(|s| s.active)
            .ok_or(LedgerError::ServiceNotFound(booking.service_id))?;
        let vehicle = catalog::fetch_vehicle(booking.vehicle_id, &mut tx)
            .await?
            .ok_or(LedgerError::VehicleNotFound(booking.vehicle_id))?;
        if vehicle.owner_id != booking.customer_id {
            return Err(LedgerError::VehicleNotOwned(booking.vehicle_id));
        }
        let reservation = reservations::insert_reservation(booking, service.price, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗓️ Reservation #{} created for customer #{} ({} at {})",
            reservation.id, reservation.customer_id, service.name, reservation.total_amount
        );
        Ok(reservation)
    }

    async fn claim_reservation(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let claimed = reservations::claim_reservation(reservation_id, washer_id, &mut tx).await?;
        let result = match claimed {
            Some(reservation) => reservation,
            None => {
                let err = reservations::classify_claim_loss(reservation_id, &mut tx).await?;
                return Err(err);
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn start_job(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let started = reservations::start_job(reservation_id, washer_id, &mut tx).await?;
        let result = match started {
            Some(reservation) => reservation,
            None => {
                let err = reservations::classify_washer_loss(reservation_id, washer_id, &mut tx).await?;
                return Err(err);
            },
        };
        tx.commit().await?;
        debug!("🧽️ Job #{reservation_id} started by washer #{washer_id}");
        Ok(result)
    }

    async fn complete_job(
        &self,
        reservation_id: i64,
        washer_id: i64,
    ) -> Result<(Reservation, Notification), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let completed = reservations::complete_job(reservation_id, washer_id, &mut tx).await?;
        let reservation = match completed {
            Some(reservation) => reservation,
            None => {
                let err = reservations::classify_washer_loss(reservation_id, washer_id, &mut tx).await?;
                return Err(err);
            },
        };
        users::incr_completed_jobs(washer_id, &mut tx).await?;
        let note = NewNotification::new(
            reservation.customer_id,
            "Service completed",
            format!("Your wash is done. Total: {}.", reservation.total_amount),
            "job_completed",
        )
        .with_action_url(format!("/reservations/{reservation_id}"));
        let notification = notifications::insert_notification(note, &mut tx).await?;
        tx.commit().await?;
        debug!("🧽️ Job #{reservation_id} completed by washer #{washer_id}");
        Ok((reservation, notification))
    }

    async fn cancel_reservation(
        &self,
        reservation_id: i64,
        acting_customer: Option<i64>,
    ) -> Result<(Reservation, Option<Notification>), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let cancelled = reservations::cancel_reservation(reservation_id, acting_customer, &mut tx).await?;
        let (reservation, prev_washer) = match cancelled {
            Some(outcome) => outcome,
            None => {
                let err = reservations::classify_cancel_loss(reservation_id, acting_customer, &mut tx).await?;
                return Err(err);
            },
        };
        let notification = match prev_washer {
            Some(washer_id) => {
                let note = NewNotification::new(
                    washer_id,
                    "Job cancelled",
                    format!("Job #{reservation_id} was cancelled before you started."),
                    "job_cancelled",
                );
                Some(notifications::insert_notification(note, &mut tx).await?)
            },
            None => None,
        };
        tx.commit().await?;
        debug!("🗓️ Reservation #{reservation_id} cancelled");
        Ok((reservation, notification))
    }

    async fn update_eta(
        &self,
        reservation_id: i64,
        washer_id: i64,
        eta: DateTime<Utc>,
    ) -> Result<(Reservation, Notification), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let updated = reservations::set_eta(reservation_id, washer_id, eta, &mut tx).await?;
        let reservation = match updated {
            Some(reservation) => reservation,
            None => {
                let err = reservations::classify_washer_loss(reservation_id, washer_id, &mut tx).await?;
                return Err(err);
            },
        };
        let note = NewNotification::new(
            reservation.customer_id,
            "Washer on the way",
            format!("Your washer expects to arrive at {}.", eta.format("%H:%M")),
            "washer_on_the_way",
        );
        let notification = notifications::insert_notification(note, &mut tx).await?;
        tx.commit().await?;
        Ok((reservation, notification))
    }

    async fn assign_washer(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError> {
        // Same compare-and-swap as a washer-initiated claim; only the caller differs.
        self.claim_reservation(reservation_id, washer_id).await
    }

    async fn edit_reservation(
        &self,
        reservation_id: i64,
        customer_id: i64,
        edit: EditReservationRequest,
    ) -> Result<Reservation, LedgerError> {
        let mut tx = self.pool.begin().await?;
        // A service change re-snapshots the price from the new service's current price.
        let new_total = match edit.new_service_id {
            Some(service_id) => {
                let service = catalog::fetch_service(service_id, &mut tx)
                    .await?
                    .filter(|s| s.active)
                    .ok_or(LedgerError::ServiceNotFound(service_id))?;
                Some(service.price)
            },
            None => None,
        };
        if let Some(vehicle_id) = edit.new_vehicle_id {
            let vehicle =
                catalog::fetch_vehicle(vehicle_id, &mut tx).await?.ok_or(LedgerError::VehicleNotFound(vehicle_id))?;
            if vehicle.owner_id != customer_id {
                return Err(LedgerError::VehicleNotOwned(vehicle_id));
            }
        }
        let edited = reservations::edit_reservation(reservation_id, customer_id, edit, new_total, &mut tx).await?;
        let reservation = match edited {
            Some(reservation) => reservation,
            None => {
                let err = reservations::classify_edit_loss(reservation_id, customer_id, &mut tx).await?;
                return Err(err);
            },
        };
        tx.commit().await?;
        debug!("📝️ Reservation #{reservation_id} edited");
        Ok(reservation)
    }

    async fn fetch_available_jobs(&self) -> Result<Vec<AvailableJob>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reservations::fetch_available_jobs(&mut conn).await?)
    }

    async fn fetch_reservation(&self, reservation_id: i64) -> Result<Option<Reservation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reservations::fetch_reservation(reservation_id, &mut conn).await?)
    }

    async fn search_reservations(&self, filter: ReservationQueryFilter) -> Result<Vec<Reservation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reservations::search_reservations(filter, &mut conn).await?)
    }

    async fn rate_reservation(
        &self,
        reservation_id: i64,
        customer_id: i64,
        stars: i64,
        comment: Option<String>,
    ) -> Result<Rating, LedgerError> {
        if !(1..=5).contains(&stars) {
            return Err(LedgerError::InvalidStars(stars));
        }
        let mut tx = self.pool.begin().await?;
        let reservation = reservations::fetch_reservation(reservation_id, &mut tx)
            .await?
            .ok_or(LedgerError::ReservationNotFound(reservation_id))?;
        if reservation.customer_id != customer_id {
            return Err(LedgerError::NotYourReservation(reservation_id));
        }
        if reservation.status != crate::db_types::ReservationStatus::Completed {
            return Err(LedgerError::InvalidState(reservation.status));
        }
        let washer_id = reservation.washer_id.ok_or_else(|| {
            error!("🗓️ Completed reservation #{reservation_id} has no washer. This is a data integrity bug.");
            LedgerError::DatabaseError(format!("Completed reservation {reservation_id} has no washer"))
        })?;
        let rating = ratings::insert_rating(reservation_id, customer_id, washer_id, stars, comment, &mut tx)
            .await?
            .ok_or(LedgerError::AlreadyRated(reservation_id))?;
        users::apply_rating(washer_id, stars, &mut tx).await?;
        tx.commit().await?;
        debug!("⭐️ Reservation #{reservation_id} rated {stars} stars");
        Ok(rating)
    }
}

impl PaymentDatabase for SqliteDatabase {
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentError> {
        let mut tx = self.pool.begin().await?;
        let reservation_id = payment.reservation_id;
        let exists = reservations::fetch_reservation(reservation_id, &mut tx).await?;
        if exists.is_none() {
            return Err(PaymentError::ReservationNotFound(reservation_id));
        }
        let payment = payments::insert_payment(payment, &mut tx).await?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn confirm_cash_payment(&self, payment_id: i64, txref: &str) -> Result<Payment, PaymentError> {
        let mut tx = self.pool.begin().await?;
        let confirmed = payments::confirm_cash_payment(payment_id, txref, &mut tx).await?;
        let payment = match confirmed {
            Some(payment) => payment,
            None => {
                let existing =
                    payments::fetch_payment(payment_id, &mut tx).await?.ok_or(PaymentError::PaymentNotFound(payment_id))?;
                return Err(PaymentError::InvalidStatus(existing.status));
            },
        };
        tx.commit().await?;
        info!("💰️ Cash payment #{payment_id} confirmed with reference {txref}");
        Ok(payment)
    }

    async fn complete_payment_by_ref(
        &self,
        processor_ref: &str,
        txref: &str,
    ) -> Result<Option<Payment>, PaymentError> {
        let mut tx = self.pool.begin().await?;
        let completed = payments::complete_payment_by_ref(processor_ref, txref, &mut tx).await?;
        let result = match completed {
            Some(payment) => Some(payment),
            None => {
                let existing = payments::fetch_payment_by_ref(processor_ref, &mut tx)
                    .await?
                    .ok_or_else(|| PaymentError::UnknownProcessorRef(processor_ref.to_string()))?;
                match existing.status {
                    // Redelivery of an event we have already applied: benign no-op.
                    crate::db_types::PaymentStatus::Completed => None,
                    other => return Err(PaymentError::InvalidStatus(other)),
                }
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn fail_payment_by_ref(&self, processor_ref: &str, reason: &str) -> Result<Option<Payment>, PaymentError> {
        let mut tx = self.pool.begin().await?;
        let failed = payments::fail_payment_by_ref(processor_ref, reason, &mut tx).await?;
        let result = match failed {
            Some(payment) => Some(payment),
            None => {
                let existing = payments::fetch_payment_by_ref(processor_ref, &mut tx)
                    .await?
                    .ok_or_else(|| PaymentError::UnknownProcessorRef(processor_ref.to_string()))?;
                match existing.status {
                    crate::db_types::PaymentStatus::Failed => None,
                    other => return Err(PaymentError::InvalidStatus(other)),
                }
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn refund_payment_by_ref(&self, processor_ref: &str) -> Result<Option<Payment>, PaymentError> {
        let mut tx = self.pool.begin().await?;
        let refunded = payments::refund_payment_by_ref(processor_ref, &mut tx).await?;
        let result = match refunded {
            Some(payment) => Some(payment),
            None => {
                let existing = payments::fetch_payment_by_ref(processor_ref, &mut tx)
                    .await?
                    .ok_or_else(|| PaymentError::UnknownProcessorRef(processor_ref.to_string()))?;
                match existing.status {
                    crate::db_types::PaymentStatus::Refunded => None,
                    other => return Err(PaymentError::InvalidStatus(other)),
                }
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn refund_payment(&self, payment_id: i64) -> Result<Payment, PaymentError> {
        let mut tx = self.pool.begin().await?;
        let refunded = payments::refund_payment(payment_id, &mut tx).await?;
        let payment = match refunded {
            Some(payment) => payment,
            None => {
                let existing =
                    payments::fetch_payment(payment_id, &mut tx).await?.ok_or(PaymentError::PaymentNotFound(payment_id))?;
                return Err(PaymentError::InvalidStatus(existing.status));
            },
        };
        tx.commit().await?;
        info!("💰️ Payment #{payment_id} refunded");
        Ok(payment)
    }

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, PaymentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment(payment_id, &mut conn).await?)
    }

    async fn fetch_payment_by_ref(&self, processor_ref: &str) -> Result<Option<Payment>, PaymentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment_by_ref(processor_ref, &mut conn).await?)
    }

    async fn fetch_payments_for_reservation(&self, reservation_id: i64) -> Result<Vec<Payment>, PaymentError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payments_for_reservation(reservation_id, &mut conn).await?)
    }
}

impl MessagingDatabase for SqliteDatabase {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, MessagingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::insert_notification(notification, &mut conn).await?)
    }

    async fn fetch_notifications(&self, user_id: i64) -> Result<NotificationFeed, MessagingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::fetch_notifications(user_id, &mut conn).await?)
    }

    async fn mark_notification_read(
        &self,
        notification_id: i64,
        user_id: i64,
    ) -> Result<Notification, MessagingError> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_notification_read(notification_id, user_id, &mut conn)
            .await?
            .ok_or(MessagingError::NotificationNotFound(notification_id))
    }

    async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64, MessagingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::mark_all_notifications_read(user_id, &mut conn).await?)
    }

    async fn delete_notification(&self, notification_id: i64, user_id: i64) -> Result<(), MessagingError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = notifications::delete_notification(notification_id, user_id, &mut conn).await?;
        if deleted == 0 {
            return Err(MessagingError::NotificationNotFound(notification_id));
        }
        Ok(())
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message, MessagingError> {
        if message.content.trim().is_empty() {
            return Err(MessagingError::EmptyContent);
        }
        let mut tx = self.pool.begin().await?;
        if !users::user_exists(message.receiver_id, &mut tx).await? {
            return Err(MessagingError::UserNotFound(message.receiver_id));
        }
        let message = messages::insert_message(message, &mut tx).await?;
        tx.commit().await?;
        trace!("💬️ Message #{} stored ({} → {})", message.id, message.sender_id, message.receiver_id);
        Ok(message)
    }

    async fn fetch_conversations(&self, user_id: i64) -> Result<Vec<ConversationSummary>, MessagingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(messages::fetch_conversations(user_id, &mut conn).await?)
    }

    async fn fetch_conversation(&self, user_id: i64, partner_id: i64) -> Result<Vec<Message>, MessagingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(messages::fetch_conversation(user_id, partner_id, &mut conn).await?)
    }

    async fn mark_message_read(&self, message_id: i64, receiver_id: i64) -> Result<Message, MessagingError> {
        let mut conn = self.pool.acquire().await?;
        messages::mark_message_read(message_id, receiver_id, &mut conn)
            .await?
            .ok_or(MessagingError::MessageNotFound(message_id))
    }

    async fn mark_conversation_read(&self, receiver_id: i64, partner_id: i64) -> Result<u64, MessagingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(messages::mark_conversation_read(receiver_id, partner_id, &mut conn).await?)
    }
}
