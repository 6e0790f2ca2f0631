use thiserror::Error;

#[derive(Debug, Error)]
pub enum CardGateError {
    #[error("Could not initialize gateway client: {0}")]
    Initialization(String),
    #[error("Could not reach the payment gateway: {0}")]
    Unreachable(String),
    #[error("Could not deserialize gateway response: {0}")]
    JsonError(String),
    #[error("Gateway request failed. Error {status}. {message}")]
    RequestFailed { status: u16, message: String },
    #[error("Unknown intent reference: {0}")]
    UnknownIntent(String),
    #[error("Refund rejected by the gateway: {0}")]
    RefundRejected(String),
}
