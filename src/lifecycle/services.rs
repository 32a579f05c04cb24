use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    applier::{plan, PlannedWrite},
    earning::EarningsSummary,
    guard::{GuardPolicy, Transition},
    store::{ParcelStore, RiderStore},
};
use crate::{error::AppError, parcels::repo_types::Parcel};

/// Single entry point for every parcel status mutation.
#[derive(Clone)]
pub struct Lifecycle {
    pub(super) parcels: Arc<dyn ParcelStore>,
    pub(super) riders: Arc<dyn RiderStore>,
    pub(super) policy: GuardPolicy,
}

impl Lifecycle {
    pub fn new(
        parcels: Arc<dyn ParcelStore>,
        riders: Arc<dyn RiderStore>,
        policy: GuardPolicy,
    ) -> Self {
        Self {
            parcels,
            riders,
            policy,
        }
    }

    pub(super) async fn load(&self, id: Uuid) -> Result<Parcel, AppError> {
        self.parcels
            .find(id)
            .await?
            .ok_or(AppError::NotFound("parcel"))
    }

    /// Run a planned write and return the parcel as stored afterwards.
    ///
    /// Zero matches means either the parcel vanished (`NotFound`) or it no
    /// longer satisfies the precondition (`Conflict`).
    pub(super) async fn commit(&self, id: Uuid, write: &PlannedWrite) -> Result<Parcel, AppError> {
        let matched = self.parcels.conditional_update(id, write).await?;
        let current = self.parcels.find(id).await?;
        match (matched, current) {
            (_, None) => Err(AppError::NotFound("parcel")),
            (0, Some(parcel)) => {
                warn!(parcel_id = %id, delivery_status = %parcel.delivery_status, "conditional update matched nothing");
                Err(AppError::Conflict(
                    "parcel changed while the request was processed".into(),
                ))
            }
            (_, Some(parcel)) => Ok(parcel),
        }
    }

    #[instrument(skip(self))]
    pub async fn toggle_delivery(&self, id: Uuid, now: OffsetDateTime) -> Result<Parcel, AppError> {
        let parcel = self.load(id).await?;
        let write = plan(&parcel.state(), &Transition::ToggleDelivery, &self.policy, now)?;
        let updated = self.commit(id, &write).await?;
        info!(
            parcel_id = %id,
            from = %parcel.delivery_status,
            to = %updated.delivery_status,
            "delivery status toggled"
        );
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn cashout(&self, id: Uuid, now: OffsetDateTime) -> Result<Parcel, AppError> {
        let parcel = self.load(id).await?;
        let write = plan(&parcel.state(), &Transition::Cashout, &self.policy, now)?;
        let updated = self.commit(id, &write).await?;
        info!(parcel_id = %id, "parcel cashed out");
        Ok(updated)
    }

    /// Returns how many parcels were actually modified, which can be fewer
    /// than the rider's eligible parcels seen earlier if another request raced.
    #[instrument(skip(self))]
    pub async fn cashout_all(&self, rider_email: &str, now: OffsetDateTime) -> Result<u64, AppError> {
        let email = rider_email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AppError::InvalidInput("rider email is required".into()));
        }
        let modified = self.parcels.cashout_all(&email, now).await?;
        info!(rider_email = %email, modified, "bulk cashout completed");
        Ok(modified)
    }

    /// Delivered and in-transit parcels of a rider plus earnings totals.
    pub async fn rider_earnings(
        &self,
        rider_email: &str,
    ) -> Result<(Vec<Parcel>, EarningsSummary), AppError> {
        let email = rider_email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AppError::InvalidInput("rider email is required".into()));
        }
        let parcels = self.parcels.list_carried_by(&email).await?;
        let summary = EarningsSummary::from_parcels(&parcels)?;
        Ok((parcels, summary))
    }
}
