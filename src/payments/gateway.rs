use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::PaymentGatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("unexpected gateway response: {0}")]
    UnexpectedResponse(String),
}

/// Card payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, GatewayError>;
}

/// Stripe-compatible payment intents API.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    http: Client,
    base_url: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(cfg: &PaymentGatewayConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            secret_key: cfg.secret_key.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        let url = format!("{}/v1/payment_intents", self.base_url);
        let amount = amount_cents.to_string();
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&[("amount", amount.as_str()), ("currency", currency)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::UnexpectedResponse(format!(
                "create intent failed with status {status}: {text}"
            )));
        }

        let intent: PaymentIntent = response.json().await?;
        debug!(intent_id = %intent.id, amount_cents, currency, "payment intent created");
        Ok(intent)
    }
}

#[cfg(test)]
pub(crate) struct FakeGateway;

#[cfg(test)]
#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        Ok(PaymentIntent {
            id: format!("pi_{amount_cents}_{currency}"),
            client_secret: format!("pi_{amount_cents}_{currency}_secret"),
        })
    }
}
