use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};

use async_trait::async_trait;
use log::*;
use wash_common::Cents;

use crate::{CardGateError, CardProcessor, PaymentIntent};

/// Deterministic in-process stand-in for the card gateway.
///
/// Intent references are sequential (`mock_pi_1`, `mock_pi_2`, ...) so that tests can predict
/// them. Refunds succeed only for intents the mock itself issued, which lets tests exercise the
/// unknown-reference failure path as well.
#[derive(Default)]
pub struct MockGateway {
    counter: AtomicU64,
    issued: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CardProcessor for MockGateway {
    async fn create_intent(&self, amount: Cents, metadata: &str) -> Result<PaymentIntent, CardGateError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let intent_ref = format!("mock_pi_{n}");
        let client_secret = format!("{intent_ref}_secret_{}", amount.value());
        self.issued.lock().map_err(|e| CardGateError::Initialization(e.to_string()))?.push(intent_ref.clone());
        debug!("💳️ Mock gateway issued intent {intent_ref} for {amount} ({metadata})");
        Ok(PaymentIntent { intent_ref, client_secret, amount })
    }

    async fn refund(&self, intent_ref: &str) -> Result<(), CardGateError> {
        let known =
            self.issued.lock().map_err(|e| CardGateError::Initialization(e.to_string()))?.iter().any(|i| i == intent_ref);
        if known {
            debug!("💳️ Mock gateway refunded intent {intent_ref}");
            Ok(())
        } else {
            Err(CardGateError::UnknownIntent(intent_ref.to_string()))
        }
    }

    fn is_mock(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn mock_intents_are_deterministic() {
        let gw = MockGateway::new();
        let a = gw.create_intent(Cents::from(2000), "reservation:1").await.unwrap();
        let b = gw.create_intent(Cents::from(3500), "reservation:2").await.unwrap();
        assert_eq!(a.intent_ref, "mock_pi_1");
        assert_eq!(b.intent_ref, "mock_pi_2");
        assert!(gw.is_mock());
    }

    #[tokio::test]
    async fn refund_of_unknown_intent_fails() {
        let gw = MockGateway::new();
        let intent = gw.create_intent(Cents::from(2000), "reservation:1").await.unwrap();
        assert!(gw.refund(&intent.intent_ref).await.is_ok());
        let err = gw.refund("pi_never_issued").await.unwrap_err();
        assert!(matches!(err, CardGateError::UnknownIntent(_)));
    }
}
