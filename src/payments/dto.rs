use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{NewPayment, Payment};
use crate::{error::AppError, lifecycle::parse_amount};

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    #[serde(alias = "amountInCent")]
    pub amount_in_cents: i64,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CreateIntentRequest {
    /// Amount and lowercase ISO currency code, `usd` when absent.
    pub fn validate(&self) -> Result<(i64, String), AppError> {
        if self.amount_in_cents <= 0 {
            return Err(AppError::InvalidInput("amount must be positive".into()));
        }
        let currency = self
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("usd")
            .to_lowercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::InvalidInput(format!("invalid currency: {currency}")));
        }
        Ok((self.amount_in_cents, currency))
    }
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub client_secret: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordPaymentRequest {
    #[serde(default)]
    pub parcel_id: String,
    #[serde(default)]
    pub payment_intent_id: String,
    #[serde(default)]
    pub amount: serde_json::Value,
}

impl RecordPaymentRequest {
    pub fn into_new_payment(self, payer_email: &str) -> Result<NewPayment, AppError> {
        let parcel_id = self.parcel_id.trim();
        let intent = self.payment_intent_id.trim();
        if parcel_id.is_empty() || intent.is_empty() || self.amount.is_null() {
            return Err(AppError::InvalidInput(
                "parcel_id, payment_intent_id and amount are required".into(),
            ));
        }
        let parcel_id = Uuid::parse_str(parcel_id)
            .map_err(|_| AppError::InvalidInput(format!("invalid parcel id: {parcel_id}")))?;
        let amount = parse_amount(&self.amount)?;
        if amount.is_zero() {
            return Err(AppError::InvalidInput("amount must be positive".into()));
        }
        Ok(NewPayment {
            parcel_id,
            payment_intent_id: intent.to_string(),
            payer_email: payer_email.to_string(),
            amount,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentsQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordedPayment {
    pub message: &'static str,
    pub payment: Payment,
}
