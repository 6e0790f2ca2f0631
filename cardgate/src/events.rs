use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// Header carrying the hex HMAC-SHA256 signature of the raw webhook body.
pub const SIGNATURE_HEADER: &str = "X-Cardgate-Signature";

/// A webhook callback event from the card gateway.
///
/// The gateway identifies payments by its own intent reference, never by our payment ids. Event
/// types beyond the three we act on exist (and more may be added); consumers must ignore types
/// they do not recognize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: GatewayEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEventData {
    pub intent_ref: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl GatewayEvent {
    pub fn succeeded(intent_ref: &str) -> Self {
        Self {
            event_type: "payment_intent.succeeded".to_string(),
            data: GatewayEventData { intent_ref: intent_ref.to_string(), reason: None },
        }
    }

    pub fn failed(intent_ref: &str, reason: &str) -> Self {
        Self {
            event_type: "payment_intent.payment_failed".to_string(),
            data: GatewayEventData { intent_ref: intent_ref.to_string(), reason: Some(reason.to_string()) },
        }
    }

    pub fn refunded(intent_ref: &str) -> Self {
        Self {
            event_type: "charge.refunded".to_string(),
            data: GatewayEventData { intent_ref: intent_ref.to_string(), reason: None },
        }
    }
}

/// Calculate the hex HMAC-SHA256 signature for a webhook body.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Check a webhook signature against the raw request body. Comparison happens on the hex digests;
/// an empty secret never validates.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    sign_payload(secret, body) == signature.to_ascii_lowercase()
}
