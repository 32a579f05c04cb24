use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::Rider;
use crate::{
    lifecycle::{EarningsSummary, RiderApproval, RiderWorkStatus},
    parcels::dto::ParcelView,
};

#[derive(Debug, Deserialize)]
pub struct CreateRiderRequest {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub region: String,
    pub district: String,
}

#[derive(Debug, Deserialize)]
pub struct DistrictQuery {
    pub district: String,
}

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub status: Option<RiderApproval>,
    pub rider_status: Option<RiderWorkStatus>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct DecisionOutcome {
    pub rider: Rider,
    /// Whether the rider's user account was switched to the rider role.
    pub role_updated: bool,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub rider_id: Uuid,
    pub rider_status: RiderWorkStatus,
}

#[derive(Debug, Deserialize)]
pub struct RiderEmailQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CompletedParcels {
    pub parcels: Vec<ParcelView>,
    pub summary: EarningsSummary,
}

#[derive(Debug, Serialize)]
pub struct CashoutAllResponse {
    pub modified: u64,
}
