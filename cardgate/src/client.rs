use std::sync::Arc;

use async_trait::async_trait;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use wash_common::Cents;

use crate::{CardGateError, CardProcessor, GatewayConfig, PaymentIntent};

/// HTTP client for the real card gateway.
///
/// The gateway exposes a small REST API: `POST /payment_intents` opens an intent and
/// `POST /refunds` reverses a completed one. Authentication is a bearer API key sent on every
/// request.
#[derive(Clone)]
pub struct GatewayClient {
    config: GatewayConfig,
    client: Arc<Client>,
}

#[derive(Debug, Serialize)]
struct CreateIntentRequest<'a> {
    amount: i64,
    currency: &'a str,
    metadata: &'a str,
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
    amount: i64,
}

#[derive(Debug, Serialize)]
struct RefundRequest<'a> {
    intent: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    status: String,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, CardGateError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.api_key.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| CardGateError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CardGateError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, CardGateError> {
        let url = format!("{}{path}", self.config.api_url.trim_end_matches('/'));
        trace!("💳️ Sending gateway request: {url}");
        let response = self
            .client
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(|e| CardGateError::Unreachable(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ Gateway request successful. {}", response.status());
            response.json::<T>().await.map_err(|e| CardGateError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| CardGateError::Unreachable(e.to_string()))?;
            Err(CardGateError::RequestFailed { status, message })
        }
    }
}

#[async_trait]
impl CardProcessor for GatewayClient {
    async fn create_intent(&self, amount: Cents, metadata: &str) -> Result<PaymentIntent, CardGateError> {
        let body = CreateIntentRequest { amount: amount.value(), currency: "usd", metadata };
        let res: IntentResponse = self.rest_query(Method::POST, "/payment_intents", &body).await?;
        debug!("💳️ Gateway opened intent {} for {amount}", res.id);
        Ok(PaymentIntent { intent_ref: res.id, client_secret: res.client_secret, amount: Cents::from(res.amount) })
    }

    async fn refund(&self, intent_ref: &str) -> Result<(), CardGateError> {
        let body = RefundRequest { intent: intent_ref };
        let res: RefundResponse = self.rest_query(Method::POST, "/refunds", &body).await?;
        if res.status == "succeeded" || res.status == "pending" {
            info!("💳️ Gateway accepted refund for intent {intent_ref}");
            Ok(())
        } else {
            Err(CardGateError::RefundRejected(format!("intent {intent_ref} refund status: {}", res.status)))
        }
    }

    fn is_mock(&self) -> bool {
        false
    }
}
