use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{applier::PlannedWrite, status::RiderWorkStatus};
use crate::{parcels::repo_types::Parcel, riders::repo_types::Rider};

/// Parcel persistence as seen by the lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParcelStore: Send + Sync {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Parcel>>;

    /// Apply `write` only if the stored parcel still satisfies its precondition.
    /// Returns the number of parcels matched (0 or 1).
    async fn conditional_update(&self, id: Uuid, write: &PlannedWrite) -> anyhow::Result<u64>;

    /// Cash out every delivered, not yet cashed out parcel of a rider.
    /// Returns the number of parcels modified.
    async fn cashout_all(&self, rider_email: &str, at: OffsetDateTime) -> anyhow::Result<u64>;

    async fn count_in_transit_for_rider(&self, rider_id: Uuid) -> anyhow::Result<i64>;

    /// Delivered and in-transit parcels carried by a rider, newest first.
    async fn list_carried_by(&self, rider_email: &str) -> anyhow::Result<Vec<Parcel>>;
}

/// Rider persistence as seen by the lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RiderStore: Send + Sync {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Rider>>;

    async fn set_work_status(&self, id: Uuid, status: RiderWorkStatus) -> anyhow::Result<u64>;
}
