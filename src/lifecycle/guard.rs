use uuid::Uuid;

use super::{
    error::TransitionError,
    status::{CashoutStatus, DeliveryStatus, RiderApproval, Role},
};

/// Knobs that change what the guard accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardPolicy {
    /// Permit moving a delivered parcel back to in-transit as a correction.
    pub allow_redelivery: bool,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            allow_redelivery: true,
        }
    }
}

/// The slice of a persisted parcel that transition decisions depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelState {
    pub delivery_status: DeliveryStatus,
    pub cashout_status: CashoutStatus,
    pub assigned_rider: bool,
    pub rider_id: Option<Uuid>,
    pub rider_name: Option<String>,
    pub rider_email: Option<String>,
}

impl ParcelState {
    pub fn has_rider(&self) -> bool {
        self.assigned_rider
            && self.rider_id.is_some()
            && !is_blank(self.rider_name.as_deref())
            && !is_blank(self.rider_email.as_deref())
    }
}

/// Rider reference supplied with an assignment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiderRef {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
}

impl RiderRef {
    pub fn is_complete(&self) -> bool {
        self.id.is_some() && !is_blank(Some(&self.name)) && !is_blank(Some(&self.email))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<'a> {
    AssignRider(&'a RiderRef),
    ToggleDelivery,
    Cashout,
}

/// Status a toggle moves the parcel to.
pub fn next_delivery_status(current: DeliveryStatus) -> DeliveryStatus {
    match current {
        DeliveryStatus::Created => DeliveryStatus::InTransit,
        DeliveryStatus::InTransit => DeliveryStatus::Delivered,
        DeliveryStatus::Delivered => DeliveryStatus::InTransit,
    }
}

/// Decide whether `transition` is legal for a parcel in `state`. Pure.
pub fn can_transition(
    state: &ParcelState,
    transition: &Transition<'_>,
    policy: &GuardPolicy,
) -> Result<(), TransitionError> {
    match transition {
        Transition::AssignRider(rider) => {
            if !rider.is_complete() {
                return Err(TransitionError::MissingRiderData);
            }
            if state.delivery_status == DeliveryStatus::Delivered {
                return Err(TransitionError::ParcelAlreadyDelivered);
            }
            Ok(())
        }
        Transition::ToggleDelivery => match state.delivery_status {
            DeliveryStatus::Delivered if !policy.allow_redelivery => {
                Err(TransitionError::RedeliveryNotAllowed)
            }
            DeliveryStatus::Delivered if state.cashout_status == CashoutStatus::CashedOut => {
                Err(TransitionError::AlreadyCashedOut)
            }
            DeliveryStatus::Delivered => Ok(()),
            DeliveryStatus::Created | DeliveryStatus::InTransit if !state.has_rider() => {
                Err(TransitionError::RiderNotAssigned)
            }
            DeliveryStatus::Created | DeliveryStatus::InTransit => Ok(()),
        },
        Transition::Cashout => {
            if state.delivery_status != DeliveryStatus::Delivered {
                return Err(TransitionError::NotDelivered);
            }
            if state.cashout_status == CashoutStatus::CashedOut {
                return Err(TransitionError::AlreadyCashedOut);
            }
            Ok(())
        }
    }
}

/// Selection rule for bulk cashout. Matching is a filter, never a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashoutAllFilter<'a> {
    pub rider_email: &'a str,
}

impl CashoutAllFilter<'_> {
    /// Delivery status a parcel must have to be selected.
    pub const DELIVERY: DeliveryStatus = DeliveryStatus::Delivered;
    /// Cashout status a parcel must have to be selected.
    pub const PENDING: CashoutStatus = CashoutStatus::NotCashed;

    pub fn matches(&self, state: &ParcelState) -> bool {
        state.rider_email.as_deref() == Some(self.rider_email)
            && state.delivery_status == Self::DELIVERY
            && state.cashout_status == Self::PENDING
    }
}

pub fn parse_role(raw: &str) -> Result<Role, TransitionError> {
    match raw.trim() {
        "admin" => Ok(Role::Admin),
        "user" => Ok(Role::User),
        "rider" => Ok(Role::Rider),
        other => Err(TransitionError::InvalidRole(other.to_string())),
    }
}

/// Admin decision on a rider application. `pending` is not a decision.
pub fn parse_rider_decision(raw: &str) -> Result<RiderApproval, TransitionError> {
    match raw.trim() {
        "accepted" => Ok(RiderApproval::Accepted),
        "rejected" => Ok(RiderApproval::Rejected),
        other => Err(TransitionError::InvalidStatus(other.to_string())),
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(delivery_status: DeliveryStatus, cashout_status: CashoutStatus) -> ParcelState {
        ParcelState {
            delivery_status,
            cashout_status,
            assigned_rider: false,
            rider_id: None,
            rider_name: None,
            rider_email: None,
        }
    }

    fn with_rider(mut s: ParcelState) -> ParcelState {
        s.assigned_rider = true;
        s.rider_id = Some(Uuid::new_v4());
        s.rider_name = Some("Rahim".into());
        s.rider_email = Some("r@x.com".into());
        s
    }

    fn rider(id: Option<Uuid>, name: &str, email: &str) -> RiderRef {
        RiderRef {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    #[test]
    fn assign_requires_all_rider_fields() {
        let s = state(DeliveryStatus::Created, CashoutStatus::NotCashed);
        let policy = GuardPolicy::default();
        for r in [
            rider(None, "Rahim", "r@x.com"),
            rider(Some(Uuid::new_v4()), "", "r@x.com"),
            rider(Some(Uuid::new_v4()), "Rahim", "   "),
        ] {
            assert_eq!(
                can_transition(&s, &Transition::AssignRider(&r), &policy),
                Err(TransitionError::MissingRiderData)
            );
        }
    }

    #[test]
    fn assign_rejected_once_delivered() {
        let s = with_rider(state(DeliveryStatus::Delivered, CashoutStatus::NotCashed));
        let r = rider(Some(Uuid::new_v4()), "Karim", "k@x.com");
        assert_eq!(
            can_transition(&s, &Transition::AssignRider(&r), &GuardPolicy::default()),
            Err(TransitionError::ParcelAlreadyDelivered)
        );
    }

    #[test]
    fn missing_rider_data_wins_over_delivered() {
        let s = state(DeliveryStatus::Delivered, CashoutStatus::NotCashed);
        let r = rider(None, "", "");
        assert_eq!(
            can_transition(&s, &Transition::AssignRider(&r), &GuardPolicy::default()),
            Err(TransitionError::MissingRiderData)
        );
    }

    #[test]
    fn reassignment_allowed_while_in_transit() {
        let s = with_rider(state(DeliveryStatus::InTransit, CashoutStatus::NotCashed));
        let r = rider(Some(Uuid::new_v4()), "Karim", "k@x.com");
        assert!(can_transition(&s, &Transition::AssignRider(&r), &GuardPolicy::default()).is_ok());
    }

    #[test]
    fn toggle_from_created_needs_rider() {
        let policy = GuardPolicy::default();
        let bare = state(DeliveryStatus::Created, CashoutStatus::NotCashed);
        assert_eq!(
            can_transition(&bare, &Transition::ToggleDelivery, &policy),
            Err(TransitionError::RiderNotAssigned)
        );
        let assigned = with_rider(bare);
        assert!(can_transition(&assigned, &Transition::ToggleDelivery, &policy).is_ok());
    }

    #[test]
    fn assigned_flag_without_reference_is_not_a_rider() {
        let mut s = state(DeliveryStatus::Created, CashoutStatus::NotCashed);
        s.assigned_rider = true;
        assert!(!s.has_rider());
    }

    #[test]
    fn redelivery_follows_policy() {
        let s = with_rider(state(DeliveryStatus::Delivered, CashoutStatus::NotCashed));
        assert!(can_transition(&s, &Transition::ToggleDelivery, &GuardPolicy::default()).is_ok());
        let strict = GuardPolicy {
            allow_redelivery: false,
        };
        assert_eq!(
            can_transition(&s, &Transition::ToggleDelivery, &strict),
            Err(TransitionError::RedeliveryNotAllowed)
        );
    }

    #[test]
    fn cashed_out_parcel_cannot_leave_delivered() {
        let s = with_rider(state(DeliveryStatus::Delivered, CashoutStatus::CashedOut));
        assert_eq!(
            can_transition(&s, &Transition::ToggleDelivery, &GuardPolicy::default()),
            Err(TransitionError::AlreadyCashedOut)
        );
    }

    #[test]
    fn toggle_cycle() {
        assert_eq!(
            next_delivery_status(DeliveryStatus::Created),
            DeliveryStatus::InTransit
        );
        assert_eq!(
            next_delivery_status(DeliveryStatus::InTransit),
            DeliveryStatus::Delivered
        );
        assert_eq!(
            next_delivery_status(DeliveryStatus::Delivered),
            DeliveryStatus::InTransit
        );
    }

    #[test]
    fn cashout_requires_delivery_regardless_of_cashout_status() {
        let policy = GuardPolicy::default();
        for delivery in [DeliveryStatus::Created, DeliveryStatus::InTransit] {
            for cashout in [CashoutStatus::NotCashed, CashoutStatus::CashedOut] {
                assert_eq!(
                    can_transition(&state(delivery, cashout), &Transition::Cashout, &policy),
                    Err(TransitionError::NotDelivered)
                );
            }
        }
    }

    #[test]
    fn cashout_is_one_way() {
        let policy = GuardPolicy::default();
        let ready = state(DeliveryStatus::Delivered, CashoutStatus::NotCashed);
        assert!(can_transition(&ready, &Transition::Cashout, &policy).is_ok());
        let done = state(DeliveryStatus::Delivered, CashoutStatus::CashedOut);
        assert_eq!(
            can_transition(&done, &Transition::Cashout, &policy),
            Err(TransitionError::AlreadyCashedOut)
        );
    }

    #[test]
    fn cashout_all_filter_selects_only_pending_delivered_for_rider() {
        let filter = CashoutAllFilter {
            rider_email: "r@x.com",
        };
        let delivered = with_rider(state(DeliveryStatus::Delivered, CashoutStatus::NotCashed));
        assert!(filter.matches(&delivered));

        let mut other_rider = delivered.clone();
        other_rider.rider_email = Some("o@x.com".into());
        assert!(!filter.matches(&other_rider));

        let cashed = with_rider(state(DeliveryStatus::Delivered, CashoutStatus::CashedOut));
        assert!(!filter.matches(&cashed));

        let moving = with_rider(state(DeliveryStatus::InTransit, CashoutStatus::NotCashed));
        assert!(!filter.matches(&moving));
    }

    #[test]
    fn role_and_decision_parsing() {
        assert_eq!(parse_role("admin"), Ok(Role::Admin));
        assert_eq!(parse_role("rider"), Ok(Role::Rider));
        assert_eq!(
            parse_role("superuser"),
            Err(TransitionError::InvalidRole("superuser".into()))
        );
        assert_eq!(parse_rider_decision("accepted"), Ok(RiderApproval::Accepted));
        assert_eq!(parse_rider_decision("rejected"), Ok(RiderApproval::Rejected));
        assert_eq!(
            parse_rider_decision("pending"),
            Err(TransitionError::InvalidStatus("pending".into()))
        );
    }
}
