//! Database backend contracts for the wash engine.
//!
//! Every writer in the system goes through one of these traits; there are no ad hoc queries, so
//! the invariants (washer-assignment, payment status machine, read-flag semantics) are enforced
//! in exactly one place per concern.
//!
//! * [`ReservationDatabase`] owns the booking state machine and the claim protocol.
//! * [`PaymentDatabase`] owns payment records and the reconciliation transitions.
//! * [`MessagingDatabase`] owns notifications and direct messages.
//! * [`CatalogManagement`] is the read-side view of services, vehicles and user profiles that the
//!   other traits validate against.
//!
//! Backends implement all four; the public APIs are generic over them so that endpoint tests can
//! substitute mocks.

mod catalog_management;
mod messaging_database;
mod payment_database;
mod reservation_database;

pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use messaging_database::{MessagingDatabase, MessagingError};
pub use payment_database::{PaymentDatabase, PaymentError};
pub use reservation_database::{LedgerError, ReservationDatabase};
