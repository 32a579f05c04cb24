//! In-memory stores and fixtures for lifecycle tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::{macros::datetime, OffsetDateTime};
use uuid::Uuid;

use super::{
    applier::{DeliveryStamp, ParcelUpdate, PlannedWrite},
    guard::{CashoutAllFilter, GuardPolicy},
    services::Lifecycle,
    status::{
        CashoutStatus, DeliveryStatus, ParcelRiderStatus, PaymentStatus, RiderApproval,
        RiderWorkStatus,
    },
    store::{ParcelStore, RiderStore},
};
use crate::{parcels::repo_types::Parcel, riders::repo_types::Rider};

type Hook = Box<dyn FnOnce(&MemoryStore) + Send>;

/// Parcel and rider store backed by hash maps.
///
/// `on_next_update` runs a closure right before the next conditional update
/// is evaluated, which simulates a concurrent writer between read and write.
#[derive(Default)]
pub struct MemoryStore {
    parcels: Mutex<HashMap<Uuid, Parcel>>,
    riders: Mutex<HashMap<Uuid, Rider>>,
    hook: Mutex<Option<Hook>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_parcel(&self, parcel: Parcel) -> Uuid {
        let id = parcel.id;
        self.parcels.lock().unwrap().insert(id, parcel);
        id
    }

    pub fn parcel(&self, id: Uuid) -> Parcel {
        self.parcels
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .expect("parcel present")
    }

    pub fn insert_rider(&self, rider: Rider) -> Uuid {
        let id = rider.id;
        self.riders.lock().unwrap().insert(id, rider);
        id
    }

    pub fn rider(&self, id: Uuid) -> Rider {
        self.riders
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .expect("rider present")
    }

    pub fn on_next_update(&self, hook: impl FnOnce(&MemoryStore) + Send + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn parcels_mut<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, Parcel>) -> R) -> R {
        f(&mut self.parcels.lock().unwrap())
    }

    /// Number of write attempts against either store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn apply(parcel: &mut Parcel, update: &ParcelUpdate) {
    match update.clone() {
        ParcelUpdate::AssignRider {
            rider_id,
            rider_name,
            rider_email,
            rider_status,
            delivery_status,
            assigned_rider,
            assigned_at,
        } => {
            parcel.rider_id = Some(rider_id);
            parcel.rider_name = Some(rider_name);
            parcel.rider_email = Some(rider_email);
            parcel.rider_status = rider_status;
            parcel.delivery_status = delivery_status;
            parcel.assigned_rider = assigned_rider;
            parcel.assigned_at = Some(assigned_at);
        }
        ParcelUpdate::Delivery {
            delivery_status,
            stamp,
            clear_delivered_at,
        } => {
            parcel.delivery_status = delivery_status;
            if clear_delivered_at {
                parcel.delivered_at = None;
            }
            match stamp {
                DeliveryStamp::PickedAt(at) => parcel.picked_at = Some(at),
                DeliveryStamp::DeliveredAt(at) => parcel.delivered_at = Some(at),
            }
        }
        ParcelUpdate::Cashout {
            cashout_status,
            cashout_at,
        } => {
            parcel.cashout_status = cashout_status;
            parcel.cashout_at = Some(cashout_at);
        }
    }
}

#[async_trait]
impl ParcelStore for MemoryStore {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Parcel>> {
        Ok(self.parcels.lock().unwrap().get(&id).cloned())
    }

    async fn conditional_update(&self, id: Uuid, write: &PlannedWrite) -> anyhow::Result<u64> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let hook = self.hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook(self);
        }

        let mut parcels = self.parcels.lock().unwrap();
        let Some(parcel) = parcels.get_mut(&id) else {
            return Ok(0);
        };
        if !write.precondition.holds(&parcel.state()) {
            return Ok(0);
        }
        apply(parcel, &write.update);
        Ok(1)
    }

    async fn cashout_all(&self, rider_email: &str, at: OffsetDateTime) -> anyhow::Result<u64> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let filter = CashoutAllFilter { rider_email };
        let mut modified = 0;
        for parcel in self.parcels.lock().unwrap().values_mut() {
            if filter.matches(&parcel.state()) {
                parcel.cashout_status = CashoutStatus::CashedOut;
                parcel.cashout_at = Some(at);
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn count_in_transit_for_rider(&self, rider_id: Uuid) -> anyhow::Result<i64> {
        let count = self
            .parcels
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.rider_id == Some(rider_id) && p.delivery_status == DeliveryStatus::InTransit)
            .count();
        Ok(count as i64)
    }

    async fn list_carried_by(&self, rider_email: &str) -> anyhow::Result<Vec<Parcel>> {
        let mut rows: Vec<Parcel> = self
            .parcels
            .lock()
            .unwrap()
            .values()
            .filter(|p| {
                p.rider_email.as_deref() == Some(rider_email)
                    && matches!(
                        p.delivery_status,
                        DeliveryStatus::Delivered | DeliveryStatus::InTransit
                    )
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[async_trait]
impl RiderStore for MemoryStore {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Rider>> {
        Ok(self.riders.lock().unwrap().get(&id).cloned())
    }

    async fn set_work_status(&self, id: Uuid, status: RiderWorkStatus) -> anyhow::Result<u64> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match self.riders.lock().unwrap().get_mut(&id) {
            Some(rider) => {
                rider.rider_status = status;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

pub fn lifecycle_with(store: &Arc<MemoryStore>, policy: GuardPolicy) -> Lifecycle {
    Lifecycle::new(store.clone(), store.clone(), policy)
}

/// A freshly created, unassigned parcel.
pub fn parcel_fixture(cost: i64, sender_region: &str, receiver_region: &str) -> Parcel {
    let id = Uuid::new_v4();
    Parcel {
        id,
        tracking_id: format!("ZS-{}", &id.simple().to_string()[..8]),
        title: "Documents".into(),
        parcel_type: "document".into(),
        created_by: "sender@x.com".into(),
        sender_name: "Sender".into(),
        sender_region: sender_region.into(),
        sender_district: None,
        sender_address: None,
        sender_phone: None,
        receiver_name: "Receiver".into(),
        receiver_region: receiver_region.into(),
        receiver_district: None,
        receiver_address: None,
        receiver_phone: None,
        cost: Decimal::from(cost),
        delivery_status: DeliveryStatus::Created,
        payment_status: PaymentStatus::Unpaid,
        cashout_status: CashoutStatus::NotCashed,
        assigned_rider: false,
        rider_id: None,
        rider_name: None,
        rider_email: None,
        rider_status: ParcelRiderStatus::Unassigned,
        tracking_status: None,
        created_at: datetime!(2025-01-01 00:00 UTC),
        assigned_at: None,
        picked_at: None,
        delivered_at: None,
        cashout_at: None,
        last_update: None,
    }
}

/// A same-region parcel delivered by the rider with `rider_email`.
pub fn delivered_for(rider_email: &str, cost: i64) -> Parcel {
    let mut parcel = parcel_fixture(cost, "A", "A");
    parcel.delivery_status = DeliveryStatus::Delivered;
    parcel.assigned_rider = true;
    parcel.rider_id = Some(Uuid::new_v4());
    parcel.rider_name = Some("Rahim".into());
    parcel.rider_email = Some(rider_email.into());
    parcel.rider_status = ParcelRiderStatus::RiderAssigned;
    parcel
}

/// An approved rider that is free for work.
pub fn rider_fixture(email: &str) -> Rider {
    Rider {
        id: Uuid::new_v4(),
        name: "Rahim".into(),
        email: email.into(),
        phone: None,
        region: "A".into(),
        district: "Central".into(),
        status: RiderApproval::Accepted,
        rider_status: RiderWorkStatus::Available,
        created_at: datetime!(2025-01-01 00:00 UTC),
    }
}
