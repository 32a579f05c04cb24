use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use super::{
    error::TransitionError,
    status::{CashoutStatus, DeliveryStatus},
};
use crate::parcels::repo_types::Parcel;

/// 80% of the cost when pickup and drop-off share a region.
const SAME_REGION_SHARE: Decimal = Decimal::from_parts(8, 0, 0, false, 1);
/// 30% of the cost for cross-region deliveries.
const CROSS_REGION_SHARE: Decimal = Decimal::from_parts(3, 0, 0, false, 1);

/// Rider earning for a parcel. Derived on every read and never stored.
pub fn compute_rider_earning(
    cost: Decimal,
    sender_region: &str,
    receiver_region: &str,
) -> Result<Decimal, TransitionError> {
    if cost.is_sign_negative() && !cost.is_zero() {
        return Err(TransitionError::InvalidAmount(cost.to_string()));
    }
    let share = if sender_region == receiver_region {
        SAME_REGION_SHARE
    } else {
        CROSS_REGION_SHARE
    };
    Ok(cost * share)
}

/// Largest amount a `NUMERIC(12, 2)` column holds.
const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);
const MAX_SCALE: u32 = 2;

/// Strict amount parser for request bodies.
///
/// Accepts a JSON number or a plain decimal string (`"120"`, `"99.90"`).
/// Anything else, including driver-specific wrappers such as
/// `{"$numberInt": "5"}`, is rejected instead of being coerced. Amounts must
/// fit the stored precision: at most two decimals, at most `MAX_AMOUNT`.
pub fn parse_amount(value: &Value) -> Result<Decimal, TransitionError> {
    lazy_static! {
        static ref PLAIN_DECIMAL: Regex = Regex::new(r"^[0-9]+(\.[0-9]+)?$").unwrap();
    }
    let invalid = || TransitionError::InvalidAmount(value.to_string());
    let amount = match value {
        Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .map_err(|_| invalid())?
        }
        Value::String(s) if PLAIN_DECIMAL.is_match(s.trim()) => {
            Decimal::from_str(s.trim()).map_err(|_| invalid())?
        }
        _ => return Err(invalid()),
    };
    let amount = amount.normalize();
    if (amount.is_sign_negative() && !amount.is_zero())
        || amount.scale() > MAX_SCALE
        || amount > MAX_AMOUNT
    {
        return Err(invalid());
    }
    Ok(amount)
}

/// Totals over a rider's delivered parcels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EarningsSummary {
    pub delivered_parcels: u64,
    pub total_earned: Decimal,
    pub cashed_out: Decimal,
    pub pending_cashout: Decimal,
}

impl EarningsSummary {
    pub fn from_parcels<'a>(
        parcels: impl IntoIterator<Item = &'a Parcel>,
    ) -> Result<Self, TransitionError> {
        let mut summary = Self::default();
        for parcel in parcels {
            if parcel.delivery_status != DeliveryStatus::Delivered {
                continue;
            }
            let earning =
                compute_rider_earning(parcel.cost, &parcel.sender_region, &parcel.receiver_region)?;
            summary.delivered_parcels += 1;
            summary.total_earned += earning;
            match parcel.cashout_status {
                CashoutStatus::CashedOut => summary.cashed_out += earning,
                CashoutStatus::NotCashed => summary.pending_cashout += earning,
            }
        }
        Ok(summary)
    }
}
