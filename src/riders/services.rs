use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateRiderRequest, DecisionOutcome},
    repo,
    repo_types::{NewRider, Rider},
};
use crate::{
    error::AppError,
    lifecycle::{parse_rider_decision, RiderApproval, Role},
    users,
};

fn required(field: &'static str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub(crate) fn new_rider(email: &str, req: &CreateRiderRequest) -> Result<NewRider, AppError> {
    Ok(NewRider {
        name: required("name", &req.name)?,
        email: users::services::normalize_email(email)?,
        phone: req
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        region: required("region", &req.region)?,
        district: required("district", &req.district)?,
    })
}

/// Submit a rider application for the signed-in user.
pub async fn apply(db: &PgPool, email: &str, req: &CreateRiderRequest) -> Result<Rider, AppError> {
    let new = new_rider(email, req)?;
    let rider = repo::create(db, &new)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("{} already applied", new.email)))?;
    info!(rider_id = %rider.id, email = %rider.email, "rider application received");
    Ok(rider)
}

/// Accept or reject an application. Accepting also grants the rider role,
/// on a best-effort basis.
pub async fn decide(db: &PgPool, id: Uuid, raw_status: &str) -> Result<DecisionOutcome, AppError> {
    let status = parse_rider_decision(raw_status)?;
    let rider = repo::set_approval(db, id, status)
        .await?
        .ok_or(AppError::NotFound("rider"))?;

    let role_updated = match status {
        RiderApproval::Accepted => {
            match users::repo::set_role_by_email(db, &rider.email, Role::Rider).await {
                Ok(0) => {
                    warn!(rider_id = %id, email = %rider.email, "no user account for accepted rider");
                    false
                }
                Ok(_) => true,
                Err(e) => {
                    warn!(error = %e, rider_id = %id, "rider role not granted");
                    false
                }
            }
        }
        RiderApproval::Rejected | RiderApproval::Pending => false,
    };

    info!(rider_id = %id, %status, role_updated, "rider application decided");
    Ok(DecisionOutcome {
        rider,
        role_updated,
    })
}
