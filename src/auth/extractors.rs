use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{error::AppError, lifecycle::Role, state::AppState, users};

/// Caller with a valid token for a verified email address.
#[derive(Debug, Clone)]
pub struct VerifiedUser {
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for VerifiedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized("missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized("bearer token required"))?;

        let identity = match state.identity.verify(token).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "identity token rejected");
                return Err(AppError::Forbidden);
            }
        };
        if !identity.email_verified {
            warn!(email = %identity.email, "unverified email");
            return Err(AppError::Forbidden);
        }

        Ok(VerifiedUser {
            email: identity.email,
        })
    }
}

async fn role_of(state: &AppState, email: &str) -> Result<Role, AppError> {
    let role = users::repo::role_of(&state.db, email).await?;
    Ok(role.unwrap_or_default())
}

/// Verified caller whose stored role is admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub VerifiedUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user = VerifiedUser::from_request_parts(parts, state).await?;
        match role_of(state, &user.email).await? {
            Role::Admin => Ok(AdminUser(user)),
            role => {
                warn!(email = %user.email, %role, "admin route refused");
                Err(AppError::Forbidden)
            }
        }
    }
}

/// Verified caller acting as a rider, or an admin acting for one.
#[derive(Debug, Clone)]
pub struct RiderOrAdmin {
    pub user: VerifiedUser,
    pub role: Role,
}

impl RiderOrAdmin {
    /// Riders may only act for their own email.
    pub fn ensure_acts_for(&self, rider_email: &str) -> Result<(), AppError> {
        if self.role == Role::Admin || self.user.email == rider_email.trim().to_lowercase() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RiderOrAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user = VerifiedUser::from_request_parts(parts, state).await?;
        match role_of(state, &user.email).await? {
            role @ (Role::Rider | Role::Admin) => Ok(RiderOrAdmin { user, role }),
            role => {
                warn!(email = %user.email, %role, "rider route refused");
                Err(AppError::Forbidden)
            }
        }
    }
}
