//! The public-facing engine APIs.
//!
//! Each API is generic over the database trait it needs, so endpoint tests can substitute mocks,
//! and each one owns the event producers for the side effects it triggers. Events are published
//! only after the underlying transaction has committed; a dead subscriber can never fail or roll
//! back an operation.

mod messaging_api;
mod payments_api;
mod reservation_flow_api;

pub use messaging_api::MessagingApi;
pub use payments_api::{IntentResult, PaymentsApi, WebhookOutcome};
pub use reservation_flow_api::ReservationFlowApi;
