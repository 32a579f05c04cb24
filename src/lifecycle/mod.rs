//! Parcel lifecycle: status guard, transition applier, earning calculator and
//! rider assignment. Every status change of a parcel goes through [`Lifecycle`].

mod applier;
mod assignment;
mod earning;
mod error;
mod guard;
mod services;
mod status;
mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use applier::{DeliveryStamp, ParcelUpdate, PlannedWrite, Precondition};
pub use assignment::AssignmentOutcome;
pub use earning::{compute_rider_earning, parse_amount, EarningsSummary};
pub use error::{RejectionKind, TransitionError};
pub use guard::{
    parse_rider_decision, parse_role, CashoutAllFilter, GuardPolicy, ParcelState, RiderRef,
};
pub use services::Lifecycle;
pub use status::{
    CashoutStatus, DeliveryStatus, ParcelRiderStatus, PaymentStatus, RiderApproval,
    RiderWorkStatus, Role,
};
pub use store::{ParcelStore, RiderStore};
