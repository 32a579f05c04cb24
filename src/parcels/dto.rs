use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::Parcel;
use crate::{
    error::AppError,
    lifecycle::{AssignmentOutcome, DeliveryStatus, PaymentStatus, RiderRef, TransitionError},
};

#[derive(Debug, Deserialize)]
pub struct CreateParcelRequest {
    #[serde(default)]
    pub tracking_id: Option<String>,
    pub title: String,
    #[serde(alias = "type")]
    pub parcel_type: String,
    pub sender_name: String,
    pub sender_region: String,
    #[serde(default)]
    pub sender_district: Option<String>,
    #[serde(default)]
    pub sender_address: Option<String>,
    #[serde(default)]
    pub sender_phone: Option<String>,
    pub receiver_name: String,
    pub receiver_region: String,
    #[serde(default)]
    pub receiver_district: Option<String>,
    #[serde(default)]
    pub receiver_address: Option<String>,
    #[serde(default)]
    pub receiver_phone: Option<String>,
    /// Number or numeric string; validated strictly.
    pub cost: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct ParcelQuery {
    pub email: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub delivery_status: Option<DeliveryStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RiderParcelsQuery {
    pub rider_email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignRiderRequest {
    #[serde(default)]
    pub rider_id: String,
    #[serde(default)]
    pub rider_name: String,
    #[serde(default)]
    pub rider_email: String,
}

impl AssignRiderRequest {
    /// A blank id becomes `None` so the guard reports missing rider data;
    /// a present but malformed id is rejected here.
    pub fn into_rider_ref(self) -> Result<RiderRef, AppError> {
        let raw = self.rider_id.trim();
        let id = if raw.is_empty() {
            None
        } else {
            Some(
                Uuid::parse_str(raw)
                    .map_err(|_| AppError::InvalidInput(format!("invalid rider id: {raw}")))?,
            )
        };
        Ok(RiderRef {
            id,
            name: self.rider_name,
            email: self.rider_email,
        })
    }
}

/// Parcel as returned to clients, with the rider earning derived on read.
#[derive(Debug, Serialize)]
pub struct ParcelView {
    #[serde(flatten)]
    pub parcel: Parcel,
    pub rider_earning: Decimal,
}

impl TryFrom<Parcel> for ParcelView {
    type Error = TransitionError;

    fn try_from(parcel: Parcel) -> Result<Self, Self::Error> {
        let rider_earning = parcel.rider_earning()?;
        Ok(Self {
            parcel,
            rider_earning,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub parcel: ParcelView,
    pub rider_synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_rider_id: Option<Uuid>,
}

impl TryFrom<AssignmentOutcome> for AssignmentResponse {
    type Error = TransitionError;

    fn try_from(outcome: AssignmentOutcome) -> Result<Self, Self::Error> {
        Ok(Self {
            parcel: ParcelView::try_from(outcome.parcel)?,
            rider_synced: outcome.rider_synced,
            previous_rider_id: outcome.previous_rider_id,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}
