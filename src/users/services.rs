use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{dto::RoleChange, repo, repo_types::User};
use crate::{error::AppError, lifecycle::parse_role};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed, lowercased and validated email.
pub(crate) fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::InvalidInput(format!("invalid email: {email}")));
    }
    Ok(email)
}

/// Idempotent sign-up by email.
pub async fn register(
    db: &PgPool,
    raw_email: &str,
    name: Option<&str>,
) -> Result<(User, bool), AppError> {
    let email = normalize_email(raw_email)?;
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let (user, inserted) = repo::upsert_login(db, &email, name).await?;
    if inserted {
        info!(user_id = %user.id, email = %user.email, "user registered");
    }
    Ok((user, inserted))
}

/// Change a user's role. The requested role is validated before any lookup.
pub async fn change_role(db: &PgPool, id: Uuid, raw_role: &str) -> Result<RoleChange, AppError> {
    let role = parse_role(raw_role)?;
    let current = repo::find_by_id(db, id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let updated = repo::set_role(db, id, role)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    info!(user_id = %id, from = %current.role, to = %updated.role, "user role changed");
    Ok(RoleChange {
        id,
        email: updated.email,
        previous: current.role,
        role: updated.role,
    })
}
