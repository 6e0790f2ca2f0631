use chrono::{DateTime, Utc};
use mockall::mock;
use wash_engine::{
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
        ReservationStatus,
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
    CatalogApiError,
    CatalogManagement,
    LedgerError,
    MessagingDatabase,
    MessagingError,
    PaymentDatabase,
    PaymentError,
    ReservationDatabase,
};
use wash_common::Cents;

mock! {
    pub LedgerDb {}
    impl CatalogManagement for LedgerDb {
        async fn fetch_service(&self, service_id: i64) -> Result<Option<Service>, CatalogApiError>;
        async fn fetch_vehicle(&self, vehicle_id: i64) -> Result<Option<Vehicle>, CatalogApiError>;
        async fn fetch_user_profile(&self, user_id: i64) -> Result<Option<UserProfile>, CatalogApiError>;
        async fn set_washer_availability(&self, washer_id: i64, available: bool) -> Result<UserProfile, CatalogApiError>;
    }
    impl ReservationDatabase for LedgerDb {
        fn url(&self) -> &str;
        async fn create_reservation(&self, booking: NewReservation) -> Result<Reservation, LedgerError>;
        async fn claim_reservation(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError>;
        async fn start_job(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError>;
        async fn complete_job(&self, reservation_id: i64, washer_id: i64) -> Result<(Reservation, Notification), LedgerError>;
        async fn cancel_reservation(&self, reservation_id: i64, acting_customer: Option<i64>) -> Result<(Reservation, Option<Notification>), LedgerError>;
        async fn update_eta(&self, reservation_id: i64, washer_id: i64, eta: DateTime<Utc>) -> Result<(Reservation, Notification), LedgerError>;
        async fn assign_washer(&self, reservation_id: i64, washer_id: i64) -> Result<Reservation, LedgerError>;
        async fn edit_reservation(&self, reservation_id: i64, customer_id: i64, edit: EditReservationRequest) -> Result<Reservation, LedgerError>;
        async fn fetch_available_jobs(&self) -> Result<Vec<AvailableJob>, LedgerError>;
        async fn fetch_reservation(&self, reservation_id: i64) -> Result<Option<Reservation>, LedgerError>;
        async fn search_reservations(&self, filter: ReservationQueryFilter) -> Result<Vec<Reservation>, LedgerError>;
        async fn rate_reservation(&self, reservation_id: i64, customer_id: i64, stars: i64, comment: Option<String>) -> Result<Rating, LedgerError>;
    }
}

mock! {
    pub PaymentDb {}
    impl PaymentDatabase for PaymentDb {
        async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentError>;
        async fn confirm_cash_payment(&self, payment_id: i64, txref: &str) -> Result<Payment, PaymentError>;
        async fn complete_payment_by_ref(&self, processor_ref: &str, txref: &str) -> Result<Option<Payment>, PaymentError>;
        async fn fail_payment_by_ref(&self, processor_ref: &str, reason: &str) -> Result<Option<Payment>, PaymentError>;
        async fn refund_payment_by_ref(&self, processor_ref: &str) -> Result<Option<Payment>, PaymentError>;
        async fn refund_payment(&self, payment_id: i64) -> Result<Payment, PaymentError>;
        async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, PaymentError>;
        async fn fetch_payment_by_ref(&self, processor_ref: &str) -> Result<Option<Payment>, PaymentError>;
        async fn fetch_payments_for_reservation(&self, reservation_id: i64) -> Result<Vec<Payment>, PaymentError>;
    }
}

mock! {
    pub MessagingDb {}
    impl MessagingDatabase for MessagingDb {
        async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, MessagingError>;
        async fn fetch_notifications(&self, user_id: i64) -> Result<NotificationFeed, MessagingError>;
        async fn mark_notification_read(&self, notification_id: i64, user_id: i64) -> Result<Notification, MessagingError>;
        async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64, MessagingError>;
        async fn delete_notification(&self, notification_id: i64, user_id: i64) -> Result<(), MessagingError>;
        async fn insert_message(&self, message: NewMessage) -> Result<Message, MessagingError>;
        async fn fetch_conversations(&self, user_id: i64) -> Result<Vec<ConversationSummary>, MessagingError>;
        async fn fetch_conversation(&self, user_id: i64, partner_id: i64) -> Result<Vec<Message>, MessagingError>;
        async fn mark_message_read(&self, message_id: i64, receiver_id: i64) -> Result<Message, MessagingError>;
        async fn mark_conversation_read(&self, receiver_id: i64, partner_id: i64) -> Result<u64, MessagingError>;
    }
}

// ---------------------------------------  canned records  ----------------------------------------------------

pub fn sample_reservation(id: i64, customer_id: i64, status: ReservationStatus, washer_id: Option<i64>) -> Reservation {
    let ts = Utc::now();
    Reservation {
        id,
        customer_id,
        vehicle_id: 1,
        service_id: 1,
        washer_id,
        status,
        scheduled_at: ts,
        total_amount: Cents::from(2000),
        notes: None,
        address: Some("12 Main St".to_string()),
        latitude: None,
        longitude: None,
        started_at: None,
        completed_at: None,
        eta: None,
        created_at: ts,
        updated_at: ts,
    }
}

pub fn sample_payment(id: i64, status: wash_engine::db_types::PaymentStatus, method: wash_engine::db_types::PaymentMethod) -> Payment {
    let ts = Utc::now();
    Payment {
        id,
        reservation_id: 1,
        payer_id: 1,
        amount: Cents::from(2000),
        method,
        status,
        processor_ref: match method {
            wash_engine::db_types::PaymentMethod::Card => Some("mock_pi_1".to_string()),
            wash_engine::db_types::PaymentMethod::Cash => None,
        },
        txref: None,
        notes: None,
        created_at: ts,
        updated_at: ts,
    }
}

pub fn sample_message(id: i64, sender_id: i64, receiver_id: i64, content: &str) -> Message {
    Message {
        id,
        sender_id,
        sender_role: wash_engine::db_types::Role::Customer,
        receiver_id,
        content: content.to_string(),
        read: false,
        created_at: Utc::now(),
    }
}

pub fn sample_notification(id: i64, user_id: i64) -> Notification {
    Notification {
        id,
        user_id,
        title: "Service completed".to_string(),
        body: "Your wash is done.".to_string(),
        kind: "job_completed".to_string(),
        read: false,
        action_url: None,
        created_at: Utc::now(),
    }
}
