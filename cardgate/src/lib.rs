//! Card gateway integration.
//!
//! The wash platform accepts card payments through an external hosted payment processor. This
//! crate owns everything about that collaboration:
//! * the [`CardProcessor`] trait, which is the only surface the rest of the system sees,
//! * [`GatewayClient`], the HTTP client for the real processor,
//! * [`MockGateway`], a deterministic in-process stand-in used when no processor credentials are
//!   configured (and by every payment-flow test),
//! * the webhook callback payload types and the signature check for them.
//!
//! Whether the real client or the mock is used is a configuration decision made once at startup;
//! callers hold an `Arc<dyn CardProcessor>` and never branch on it again.

mod client;
mod config;
mod error;
mod events;
mod mock;

use async_trait::async_trait;
pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use error::CardGateError;
pub use events::{sign_payload, verify_signature, GatewayEvent, GatewayEventData, SIGNATURE_HEADER};
pub use mock::MockGateway;
use serde::{Deserialize, Serialize};
use wash_common::Cents;

/// A payment intent as returned by the processor.
///
/// `intent_ref` is the processor's identifier for the payment; all webhook callbacks refer to it.
/// `client_secret` is the opaque token the customer's device needs to complete the payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub intent_ref: String,
    pub client_secret: String,
    pub amount: Cents,
}

/// The seam between the payment reconciler and the card processor.
///
/// Exactly two implementations exist: [`GatewayClient`] talks to the real processor over HTTPS,
/// and [`MockGateway`] synthesizes deterministic intents without any network access. Which one is
/// live is decided by [`GatewayConfig::is_configured`] at startup.
#[async_trait]
pub trait CardProcessor: Send + Sync {
    /// Open a payment intent for the given amount. The metadata string is attached to the intent
    /// so that the processor dashboard can be matched back to a reservation.
    async fn create_intent(&self, amount: Cents, metadata: &str) -> Result<PaymentIntent, CardGateError>;

    /// Request a refund of the full amount against a previously completed intent.
    async fn refund(&self, intent_ref: &str) -> Result<(), CardGateError>;

    /// True when this processor fabricates payments rather than moving real money. The flag is
    /// surfaced to API callers so that test payments are never mistaken for real ones.
    fn is_mock(&self) -> bool;
}
