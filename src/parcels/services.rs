use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{
    dto::CreateParcelRequest,
    repo,
    repo_types::{NewParcel, Parcel},
};
use crate::{db::is_unique_violation, error::AppError, lifecycle::parse_amount};

fn generate_tracking_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("ZS-{}", raw[..10].to_uppercase())
}

fn required(field: &'static str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn new_parcel(created_by: &str, req: CreateParcelRequest) -> Result<NewParcel, AppError> {
    let cost = parse_amount(&req.cost)?;
    Ok(NewParcel {
        tracking_id: optional(req.tracking_id).unwrap_or_else(generate_tracking_id),
        title: required("title", &req.title)?,
        parcel_type: required("parcel_type", &req.parcel_type)?,
        created_by: created_by.to_string(),
        sender_name: required("sender_name", &req.sender_name)?,
        sender_region: required("sender_region", &req.sender_region)?,
        sender_district: optional(req.sender_district),
        sender_address: optional(req.sender_address),
        sender_phone: optional(req.sender_phone),
        receiver_name: required("receiver_name", &req.receiver_name)?,
        receiver_region: required("receiver_region", &req.receiver_region)?,
        receiver_district: optional(req.receiver_district),
        receiver_address: optional(req.receiver_address),
        receiver_phone: optional(req.receiver_phone),
        cost,
    })
}

/// Create a parcel in its initial state: created, unpaid, not cashed out, unassigned.
pub async fn create_parcel(
    db: &PgPool,
    created_by: &str,
    req: CreateParcelRequest,
) -> Result<Parcel, AppError> {
    let new = new_parcel(created_by, req)?;
    let parcel = match repo::insert(db, &new).await {
        Ok(parcel) => parcel,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict(format!(
                "tracking id {} already exists",
                new.tracking_id
            )))
        }
        Err(e) => return Err(e.into()),
    };
    info!(parcel_id = %parcel.id, tracking_id = %parcel.tracking_id, "parcel created");
    Ok(parcel)
}
