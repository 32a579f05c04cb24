use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    applier::plan,
    error::TransitionError,
    guard::{can_transition, RiderRef, Transition},
    services::Lifecycle,
    status::RiderWorkStatus,
};
use crate::{error::AppError, parcels::repo_types::Parcel};

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOutcome {
    pub parcel: Parcel,
    /// False when the parcel was assigned but the rider's own status could not be updated.
    pub rider_synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_rider_id: Option<Uuid>,
}

impl Lifecycle {
    /// Assign a rider to a parcel.
    ///
    /// The rider must exist and the request email must match its record; the
    /// parcel stores the record's name and email.
    ///
    /// The parcel write is authoritative. The rider's `rider_status` is a cache
    /// updated afterwards on a best-effort basis; a failure there is logged and
    /// reported through `rider_synced` without undoing the parcel write.
    #[instrument(skip(self, rider), fields(rider_id = ?rider.id))]
    pub async fn assign_rider(
        &self,
        parcel_id: Uuid,
        rider: RiderRef,
        now: OffsetDateTime,
    ) -> Result<AssignmentOutcome, AppError> {
        let Some(rider_id) = rider.id.filter(|_| rider.is_complete()) else {
            return Err(TransitionError::MissingRiderData.into());
        };

        let parcel = self.load(parcel_id).await?;
        can_transition(&parcel.state(), &Transition::AssignRider(&rider), &self.policy)?;

        let stored = self
            .riders
            .find(rider_id)
            .await?
            .ok_or(AppError::NotFound("rider"))?;
        if !stored.email.trim().eq_ignore_ascii_case(rider.email.trim()) {
            return Err(AppError::InvalidInput(format!(
                "rider email does not match rider {rider_id}"
            )));
        }

        // Name and email come from the rider record, not the request.
        let assigned = RiderRef {
            id: Some(rider_id),
            name: stored.name,
            email: stored.email,
        };
        let write = plan(
            &parcel.state(),
            &Transition::AssignRider(&assigned),
            &self.policy,
            now,
        )?;

        let updated = self.commit(parcel_id, &write).await?;
        let rider_synced = self
            .cache_rider_status(rider_id, RiderWorkStatus::RiderAssigned)
            .await;

        let previous_rider_id = parcel.rider_id.filter(|prev| *prev != rider_id);
        if let Some(prev) = previous_rider_id {
            if let Err(e) = self.reconcile_rider(prev).await {
                warn!(error = %e, rider_id = %prev, "previous rider status not reconciled");
            }
        }

        info!(%parcel_id, %rider_id, rider_synced, "rider assigned");
        Ok(AssignmentOutcome {
            parcel: updated,
            rider_synced,
            previous_rider_id,
        })
    }

    /// Recompute a rider's cached work status from the parcels it carries.
    #[instrument(skip(self))]
    pub async fn reconcile_rider(&self, rider_id: Uuid) -> Result<RiderWorkStatus, AppError> {
        if self.riders.find(rider_id).await?.is_none() {
            return Err(AppError::NotFound("rider"));
        }
        let active = self.parcels.count_in_transit_for_rider(rider_id).await?;
        let status = if active > 0 {
            RiderWorkStatus::RiderAssigned
        } else {
            RiderWorkStatus::Available
        };
        if self.riders.set_work_status(rider_id, status).await? == 0 {
            return Err(AppError::NotFound("rider"));
        }
        info!(%rider_id, active, ?status, "rider status reconciled");
        Ok(status)
    }

    async fn cache_rider_status(&self, rider_id: Uuid, status: RiderWorkStatus) -> bool {
        match self.riders.set_work_status(rider_id, status).await {
            Ok(0) => {
                warn!(%rider_id, "rider record vanished; status cache not updated");
                false
            }
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, %rider_id, "rider status cache write failed; parcel stays authoritative");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::datetime;

    use super::*;
    use crate::lifecycle::{
        guard::GuardPolicy,
        status::{DeliveryStatus, ParcelRiderStatus},
        store::MockRiderStore,
        test_support::{delivered_for, lifecycle_with, parcel_fixture, rider_fixture, MemoryStore},
    };

    const NOW: OffsetDateTime = datetime!(2025-03-01 10:00 UTC);

    fn rider_ref(id: Uuid, email: &str) -> RiderRef {
        RiderRef {
            id: Some(id),
            name: "Rahim".into(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn assignment_updates_parcel_and_rider_cache() {
        let store = MemoryStore::shared();
        let rider_id = store.insert_rider(rider_fixture("r@x.com"));
        let parcel_id = store.insert_parcel(parcel_fixture(100, "A", "A"));
        let lifecycle = lifecycle_with(&store, GuardPolicy::default());

        let outcome = lifecycle
            .assign_rider(parcel_id, rider_ref(rider_id, "r@x.com"), NOW)
            .await
            .unwrap();

        assert!(outcome.rider_synced);
        assert_eq!(outcome.previous_rider_id, None);
        let parcel = store.parcel(parcel_id);
        assert!(parcel.assigned_rider);
        assert_eq!(parcel.rider_id, Some(rider_id));
        assert_eq!(parcel.rider_name.as_deref(), Some("Rahim"));
        assert_eq!(parcel.rider_email.as_deref(), Some("r@x.com"));
        assert_eq!(parcel.rider_status, ParcelRiderStatus::RiderAssigned);
        assert_eq!(parcel.delivery_status, DeliveryStatus::InTransit);
        assert_eq!(parcel.assigned_at, Some(NOW));
        assert_eq!(
            store.rider(rider_id).rider_status,
            RiderWorkStatus::RiderAssigned
        );
    }

    #[tokio::test]
    async fn incomplete_rider_data_modifies_nothing() {
        let store = MemoryStore::shared();
        let rider_id = store.insert_rider(rider_fixture("r@x.com"));
        let parcel_id = store.insert_parcel(parcel_fixture(100, "A", "A"));
        let before = store.parcel(parcel_id);
        let lifecycle = lifecycle_with(&store, GuardPolicy::default());

        for rider in [
            RiderRef {
                id: None,
                name: "Rahim".into(),
                email: "r@x.com".into(),
            },
            RiderRef {
                id: Some(rider_id),
                name: String::new(),
                email: "r@x.com".into(),
            },
            RiderRef {
                id: Some(rider_id),
                name: "Rahim".into(),
                email: String::new(),
            },
        ] {
            let err = lifecycle.assign_rider(parcel_id, rider, NOW).await.unwrap_err();
            assert!(matches!(
                err,
                AppError::Rejected(TransitionError::MissingRiderData)
            ));
        }

        assert_eq!(store.parcel(parcel_id), before);
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.rider(rider_id).rider_status, RiderWorkStatus::Available);
    }

    #[tokio::test]
    async fn delivered_parcel_cannot_be_reassigned() {
        let store = MemoryStore::shared();
        let rider_id = store.insert_rider(rider_fixture("k@x.com"));
        let parcel_id = store.insert_parcel(delivered_for("r@x.com", 100));
        let lifecycle = lifecycle_with(&store, GuardPolicy::default());

        let err = lifecycle
            .assign_rider(parcel_id, rider_ref(rider_id, "k@x.com"), NOW)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Rejected(TransitionError::ParcelAlreadyDelivered)
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn unknown_rider_is_not_found_and_parcel_untouched() {
        let store = MemoryStore::shared();
        let parcel_id = store.insert_parcel(parcel_fixture(100, "A", "A"));
        let lifecycle = lifecycle_with(&store, GuardPolicy::default());

        let err = lifecycle
            .assign_rider(parcel_id, rider_ref(Uuid::new_v4(), "r@x.com"), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("rider")));
        assert_eq!(store.parcel(parcel_id).delivery_status, DeliveryStatus::Created);
    }

    #[tokio::test]
    async fn email_not_matching_rider_record_is_rejected() {
        let store = MemoryStore::shared();
        let rider_id = store.insert_rider(rider_fixture("r@x.com"));
        let parcel_id = store.insert_parcel(parcel_fixture(100, "A", "A"));
        let lifecycle = lifecycle_with(&store, GuardPolicy::default());

        let err = lifecycle
            .assign_rider(parcel_id, rider_ref(rider_id, "other@x.com"), NOW)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.parcel(parcel_id).rider_email, None);
    }

    #[tokio::test]
    async fn parcel_takes_name_and_email_from_rider_record() {
        let store = MemoryStore::shared();
        let rider_id = store.insert_rider(rider_fixture("r@x.com"));
        let parcel_id = store.insert_parcel(parcel_fixture(100, "A", "A"));
        let lifecycle = lifecycle_with(&store, GuardPolicy::default());

        let request = RiderRef {
            id: Some(rider_id),
            name: "Someone Else".into(),
            email: " R@X.com ".into(),
        };
        lifecycle.assign_rider(parcel_id, request, NOW).await.unwrap();

        let parcel = store.parcel(parcel_id);
        assert_eq!(parcel.rider_name.as_deref(), Some("Rahim"));
        assert_eq!(parcel.rider_email.as_deref(), Some("r@x.com"));
    }

    #[tokio::test]
    async fn rider_cache_failure_keeps_parcel_assignment() {
        let store = MemoryStore::shared();
        let parcel_id = store.insert_parcel(parcel_fixture(100, "A", "A"));
        let rider = rider_fixture("r@x.com");
        let rider_id = rider.id;

        let mut riders = MockRiderStore::new();
        riders
            .expect_find()
            .returning(move |_| Ok(Some(rider.clone())));
        riders
            .expect_set_work_status()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("write timed out")));
        let lifecycle = Lifecycle::new(store.clone(), Arc::new(riders), GuardPolicy::default());

        let outcome = lifecycle
            .assign_rider(parcel_id, rider_ref(rider_id, "r@x.com"), NOW)
            .await
            .unwrap();

        assert!(!outcome.rider_synced);
        assert_eq!(store.parcel(parcel_id).rider_id, Some(rider_id));
        assert_eq!(
            store.parcel(parcel_id).delivery_status,
            DeliveryStatus::InTransit
        );
    }

    #[tokio::test]
    async fn reassignment_frees_previous_rider() {
        let store = MemoryStore::shared();
        let first = store.insert_rider(rider_fixture("first@x.com"));
        let second = store.insert_rider(rider_fixture("second@x.com"));
        let parcel_id = store.insert_parcel(parcel_fixture(100, "A", "A"));
        let lifecycle = lifecycle_with(&store, GuardPolicy::default());

        lifecycle
            .assign_rider(parcel_id, rider_ref(first, "first@x.com"), NOW)
            .await
            .unwrap();
        let outcome = lifecycle
            .assign_rider(parcel_id, rider_ref(second, "second@x.com"), NOW)
            .await
            .unwrap();

        assert_eq!(outcome.previous_rider_id, Some(first));
        assert_eq!(store.rider(first).rider_status, RiderWorkStatus::Available);
        assert_eq!(
            store.rider(second).rider_status,
            RiderWorkStatus::RiderAssigned
        );
    }

    #[tokio::test]
    async fn reconcile_repairs_stale_cache() {
        let store = MemoryStore::shared();
        let mut stale = rider_fixture("r@x.com");
        stale.rider_status = RiderWorkStatus::RiderAssigned;
        let rider_id = store.insert_rider(stale);
        let lifecycle = lifecycle_with(&store, GuardPolicy::default());

        let status = lifecycle.reconcile_rider(rider_id).await.unwrap();
        assert_eq!(status, RiderWorkStatus::Available);
        assert_eq!(store.rider(rider_id).rider_status, RiderWorkStatus::Available);

        let err = lifecycle.reconcile_rider(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("rider")));
    }
}
