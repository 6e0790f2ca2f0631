use log::*;
use wash_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Base URL of the processor's REST API, e.g. "https://api.cardgate.example.com/v1"
    pub api_url: String,
    pub api_key: Secret,
    /// Shared secret used to verify webhook callback signatures.
    pub webhook_secret: Secret,
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = std::env::var("WASH_GATEWAY_API_URL").unwrap_or_else(|_| {
            warn!("💳️ WASH_GATEWAY_API_URL not set. Card payments will run in mock mode.");
            String::default()
        });
        let api_key = Secret::new(std::env::var("WASH_GATEWAY_API_KEY").unwrap_or_else(|_| {
            warn!("💳️ WASH_GATEWAY_API_KEY not set. Card payments will run in mock mode.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("WASH_GATEWAY_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("💳️ WASH_GATEWAY_WEBHOOK_SECRET not set. Webhook signature checks will reject all callbacks.");
            String::default()
        }));
        Self { api_url, api_key, webhook_secret }
    }

    /// A gateway is considered configured when both the API URL and key are present. Anything less
    /// and the server falls back to the deterministic mock.
    pub fn is_configured(&self) -> bool {
        !self.api_url.is_empty() && !self.api_key.is_empty()
    }
}
