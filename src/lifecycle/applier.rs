use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    error::TransitionError,
    guard::{can_transition, next_delivery_status, GuardPolicy, ParcelState, Transition},
    status::{CashoutStatus, DeliveryStatus, ParcelRiderStatus},
};

/// Condition the stored parcel must still satisfy when the update lands.
///
/// The store folds it into the update filter, so a concurrent change between
/// read and write shows up as zero matched rows instead of a lost update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    NotDelivered,
    /// Delivery status unchanged since it was read and not cashed out.
    DeliveryIs {
        status: DeliveryStatus,
        rider_assigned: bool,
    },
    Cashable,
}

impl Precondition {
    pub fn holds(&self, state: &ParcelState) -> bool {
        match *self {
            Self::NotDelivered => state.delivery_status != DeliveryStatus::Delivered,
            Self::DeliveryIs {
                status,
                rider_assigned,
            } => {
                state.delivery_status == status
                    && state.cashout_status == CashoutStatus::NotCashed
                    && (!rider_assigned || state.has_rider())
            }
            Self::Cashable => {
                state.delivery_status == DeliveryStatus::Delivered
                    && state.cashout_status == CashoutStatus::NotCashed
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStamp {
    PickedAt(OffsetDateTime),
    DeliveredAt(OffsetDateTime),
}

/// Complete field set written by one transition. Each variant is written as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParcelUpdate {
    AssignRider {
        rider_id: Uuid,
        rider_name: String,
        rider_email: String,
        rider_status: ParcelRiderStatus,
        delivery_status: DeliveryStatus,
        assigned_rider: bool,
        assigned_at: OffsetDateTime,
    },
    Delivery {
        delivery_status: DeliveryStatus,
        stamp: DeliveryStamp,
        /// Set when a delivered parcel is moved back in transit.
        clear_delivered_at: bool,
    },
    Cashout {
        cashout_status: CashoutStatus,
        cashout_at: OffsetDateTime,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub precondition: Precondition,
    pub update: ParcelUpdate,
}

/// Guard `transition` and, if legal, produce the write that performs it.
pub fn plan(
    state: &ParcelState,
    transition: &Transition<'_>,
    policy: &GuardPolicy,
    now: OffsetDateTime,
) -> Result<PlannedWrite, TransitionError> {
    can_transition(state, transition, policy)?;

    let write = match transition {
        Transition::AssignRider(rider) => {
            let rider_id = rider.id.ok_or(TransitionError::MissingRiderData)?;
            PlannedWrite {
                precondition: Precondition::NotDelivered,
                update: ParcelUpdate::AssignRider {
                    rider_id,
                    rider_name: rider.name.trim().to_string(),
                    rider_email: rider.email.trim().to_lowercase(),
                    rider_status: ParcelRiderStatus::RiderAssigned,
                    delivery_status: DeliveryStatus::InTransit,
                    assigned_rider: true,
                    assigned_at: now,
                },
            }
        }
        Transition::ToggleDelivery => {
            let target = next_delivery_status(state.delivery_status);
            let stamp = match target {
                DeliveryStatus::Delivered => DeliveryStamp::DeliveredAt(now),
                DeliveryStatus::InTransit | DeliveryStatus::Created => DeliveryStamp::PickedAt(now),
            };
            PlannedWrite {
                precondition: Precondition::DeliveryIs {
                    status: state.delivery_status,
                    rider_assigned: true,
                },
                update: ParcelUpdate::Delivery {
                    delivery_status: target,
                    stamp,
                    clear_delivered_at: state.delivery_status == DeliveryStatus::Delivered,
                },
            }
        }
        Transition::Cashout => PlannedWrite {
            precondition: Precondition::Cashable,
            update: ParcelUpdate::Cashout {
                cashout_status: CashoutStatus::CashedOut,
                cashout_at: now,
            },
        },
    };
    Ok(write)
}
