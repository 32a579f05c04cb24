use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::lifecycle::{RiderApproval, RiderWorkStatus};

pub(crate) const RIDER_COLUMNS: &str =
    "id, name, email, phone, region, district, status, rider_status, created_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Rider {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub region: String,
    pub district: String,
    /// Approval of the rider application.
    pub status: RiderApproval,
    /// Cached work status. Parcels are the source of truth.
    pub rider_status: RiderWorkStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewRider {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub region: String,
    pub district: String,
}
