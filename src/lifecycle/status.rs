use serde::{Deserialize, Serialize};

/// Where a parcel is in its delivery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    Created,
    InTransit,
    Delivered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

/// Payout state of the rider's earning on a parcel. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "cashout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CashoutStatus {
    NotCashed,
    CashedOut,
}

/// Rider state as seen from the parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "parcel_rider_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParcelRiderStatus {
    Unassigned,
    RiderAssigned,
}

/// Approval workflow of a rider application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rider_approval", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RiderApproval {
    Pending,
    Accepted,
    Rejected,
}

/// Current work state of a rider. Cached on the rider record; parcels are authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rider_work_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RiderWorkStatus {
    Available,
    RiderAssigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Rider,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InTransit => "in-transit",
            Self::Delivered => "delivered",
        }
    }
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Rider => "rider",
        }
    }
}

impl RiderApproval {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for RiderApproval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_status_uses_hyphenated_wire_names() {
        let json = serde_json::to_string(&DeliveryStatus::InTransit).unwrap();
        assert_eq!(json, "\"in-transit\"");
        let parsed: DeliveryStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(parsed, DeliveryStatus::Delivered);
        assert_eq!(DeliveryStatus::InTransit.to_string(), "in-transit");
    }

    #[test]
    fn cashout_and_rider_statuses_use_snake_case() {
        assert_eq!(
            serde_json::to_string(&CashoutStatus::CashedOut).unwrap(),
            "\"cashed_out\""
        );
        assert_eq!(
            serde_json::to_string(&ParcelRiderStatus::RiderAssigned).unwrap(),
            "\"rider_assigned\""
        );
        assert_eq!(
            serde_json::to_string(&RiderWorkStatus::Available).unwrap(),
            "\"available\""
        );
    }

    #[test]
    fn role_defaults_to_user() {
        assert_eq!(Role::default(), Role::User);
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
