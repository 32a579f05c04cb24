use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::lifecycle::{
    compute_rider_earning, CashoutStatus, DeliveryStatus, ParcelRiderStatus, ParcelState,
    PaymentStatus, TransitionError,
};

pub(crate) const PARCEL_COLUMNS: &str = r#"
    id, tracking_id, title, parcel_type, created_by,
    sender_name, sender_region, sender_district, sender_address, sender_phone,
    receiver_name, receiver_region, receiver_district, receiver_address, receiver_phone,
    cost, delivery_status, payment_status, cashout_status,
    assigned_rider, rider_id, rider_name, rider_email, rider_status,
    tracking_status, created_at, assigned_at, picked_at, delivered_at, cashout_at, last_update
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Parcel {
    pub id: Uuid,
    pub tracking_id: String,
    pub title: String,
    pub parcel_type: String,
    pub created_by: String,

    pub sender_name: String,
    pub sender_region: String,
    pub sender_district: Option<String>,
    pub sender_address: Option<String>,
    pub sender_phone: Option<String>,

    pub receiver_name: String,
    pub receiver_region: String,
    pub receiver_district: Option<String>,
    pub receiver_address: Option<String>,
    pub receiver_phone: Option<String>,

    pub cost: Decimal,
    pub delivery_status: DeliveryStatus,
    pub payment_status: PaymentStatus,
    pub cashout_status: CashoutStatus,

    pub assigned_rider: bool,
    pub rider_id: Option<Uuid>,
    pub rider_name: Option<String>,
    pub rider_email: Option<String>,
    pub rider_status: ParcelRiderStatus,

    /// Free-text status of the latest tracking event.
    pub tracking_status: Option<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub assigned_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub picked_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub delivered_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub cashout_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
}

impl Parcel {
    pub fn state(&self) -> ParcelState {
        ParcelState {
            delivery_status: self.delivery_status,
            cashout_status: self.cashout_status,
            assigned_rider: self.assigned_rider,
            rider_id: self.rider_id,
            rider_name: self.rider_name.clone(),
            rider_email: self.rider_email.clone(),
        }
    }

    pub fn rider_earning(&self) -> Result<Decimal, TransitionError> {
        compute_rider_earning(self.cost, &self.sender_region, &self.receiver_region)
    }
}

/// Validated input for a new parcel row.
#[derive(Debug, Clone)]
pub struct NewParcel {
    pub tracking_id: String,
    pub title: String,
    pub parcel_type: String,
    pub created_by: String,
    pub sender_name: String,
    pub sender_region: String,
    pub sender_district: Option<String>,
    pub sender_address: Option<String>,
    pub sender_phone: Option<String>,
    pub receiver_name: String,
    pub receiver_region: String,
    pub receiver_district: Option<String>,
    pub receiver_address: Option<String>,
    pub receiver_phone: Option<String>,
    pub cost: Decimal,
}
