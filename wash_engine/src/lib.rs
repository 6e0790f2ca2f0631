//! Wash Engine
//!
//! The engine is the core of the wash platform: it owns the booking state machine, the job-claim
//! protocol, payment reconciliation, and the durable half of the notification/chat layer. It is
//! HTTP-agnostic; the server crate is a thin shell around the APIs exported here.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly; use the public APIs instead. The
//!    exception is the data types used in the database, defined in [`mod@db_types`].
//! 2. The engine public API ([`mod@api`]): [`ReservationFlowApi`], [`PaymentsApi`] and
//!    [`MessagingApi`]. Backends implement the traits in [`mod@traits`] to support these APIs.
//! 3. The event hook system ([`mod@events`]). State changes publish events after their
//!    transaction commits; the real-time gateway subscribes to them to keep connected clients
//!    current without polling.
mod api;

pub mod db_types;
pub mod events;
pub mod reservation_objects;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use api::{IntentResult, MessagingApi, PaymentsApi, ReservationFlowApi, WebhookOutcome};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CatalogApiError,
    CatalogManagement,
    LedgerError,
    MessagingDatabase,
    MessagingError,
    PaymentDatabase,
    PaymentError,
    ReservationDatabase,
};
