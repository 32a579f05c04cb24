use thiserror::Error;

/// Why the lifecycle refused a requested change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("missing rider data: rider id, name and email are required")]
    MissingRiderData,

    #[error("parcel already delivered")]
    ParcelAlreadyDelivered,

    #[error("parcel has no assigned rider")]
    RiderNotAssigned,

    #[error("delivered parcels cannot be moved back to in-transit")]
    RedeliveryNotAllowed,

    #[error("parcel not delivered yet")]
    NotDelivered,

    #[error("parcel already cashed out")]
    AlreadyCashedOut,

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// Whether a rejection is about malformed input or about the current state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    InvalidInput,
    InvalidState,
}

impl TransitionError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::MissingRiderData
            | Self::InvalidRole(..)
            | Self::InvalidStatus(..)
            | Self::InvalidAmount(..) => RejectionKind::InvalidInput,
            Self::ParcelAlreadyDelivered
            | Self::RiderNotAssigned
            | Self::RedeliveryNotAllowed
            | Self::NotDelivered
            | Self::AlreadyCashedOut => RejectionKind::InvalidState,
        }
    }

    /// Stable machine-readable reason, returned to clients next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRiderData => "MissingRiderData",
            Self::ParcelAlreadyDelivered => "ParcelAlreadyDelivered",
            Self::RiderNotAssigned => "RiderNotAssigned",
            Self::RedeliveryNotAllowed => "RedeliveryNotAllowed",
            Self::NotDelivered => "NotDelivered",
            Self::AlreadyCashedOut => "AlreadyCashedOut",
            Self::InvalidRole(..) => "InvalidRole",
            Self::InvalidStatus(..) => "InvalidStatus",
            Self::InvalidAmount(..) => "InvalidAmount",
        }
    }
}
