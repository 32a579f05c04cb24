use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        AssignRiderRequest, AssignmentResponse, CreateParcelRequest, DeletedResponse, ParcelQuery,
        ParcelView, RiderParcelsQuery,
    },
    repo::{self, ParcelFilter},
    repo_types::Parcel,
    services,
};
use crate::{
    auth::{AdminUser, RiderOrAdmin, VerifiedUser},
    error::AppError,
    lifecycle::Role,
    state::AppState,
};

pub fn parcel_routes() -> Router<AppState> {
    Router::new()
        .route("/parcels", get(list_parcels).post(create_parcel))
        .route("/parcels/rider", get(rider_parcels))
        .route("/parcels/:id", get(get_parcel).delete(delete_parcel))
        .route("/parcels/:id/assign-rider", patch(assign_rider))
        .route("/parcels/:id/toggle-delivery", patch(toggle_delivery))
        .route("/parcels/:id/cashout", patch(cashout))
}

fn views(parcels: Vec<Parcel>) -> Result<Vec<ParcelView>, AppError> {
    let views = parcels
        .into_iter()
        .map(ParcelView::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(views)
}

/// Riders may only move parcels assigned to them; admins may move any.
async fn ensure_carrier(state: &AppState, caller: &RiderOrAdmin, id: Uuid) -> Result<(), AppError> {
    if caller.role == Role::Admin {
        return Ok(());
    }
    let parcel = repo::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("parcel"))?;
    caller.ensure_acts_for(parcel.rider_email.as_deref().unwrap_or_default())
}

#[instrument(skip(state, user, payload))]
pub async fn create_parcel(
    State(state): State<AppState>,
    user: VerifiedUser,
    Json(payload): Json<CreateParcelRequest>,
) -> Result<(StatusCode, Json<ParcelView>), AppError> {
    let parcel = services::create_parcel(&state.db, &user.email, payload).await?;
    Ok((StatusCode::CREATED, Json(ParcelView::try_from(parcel)?)))
}

#[instrument(skip(state))]
pub async fn list_parcels(
    State(state): State<AppState>,
    Query(q): Query<ParcelQuery>,
) -> Result<Json<Vec<ParcelView>>, AppError> {
    let filter = ParcelFilter {
        created_by: q.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()),
        payment_status: q.payment_status,
        delivery_status: q.delivery_status,
        search: q.search.filter(|s| !s.trim().is_empty()),
    };
    let parcels = repo::list(&state.db, &filter).await?;
    Ok(Json(views(parcels)?))
}

#[instrument(skip(state))]
pub async fn rider_parcels(
    State(state): State<AppState>,
    Query(q): Query<RiderParcelsQuery>,
) -> Result<Json<Vec<ParcelView>>, AppError> {
    let email = q.rider_email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::InvalidInput("rider_email is required".into()));
    }
    let parcels = repo::list_for_rider(&state.db, &email).await?;
    Ok(Json(views(parcels)?))
}

#[instrument(skip(state))]
pub async fn get_parcel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ParcelView>, AppError> {
    let parcel = repo::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("parcel"))?;
    Ok(Json(ParcelView::try_from(parcel)?))
}

#[instrument(skip(state, user))]
pub async fn delete_parcel(
    State(state): State<AppState>,
    user: VerifiedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    let deleted = repo::delete(&state.db, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("parcel"));
    }
    info!(parcel_id = %id, by = %user.email, "parcel deleted");
    Ok(Json(DeletedResponse { deleted }))
}

#[instrument(skip(state, _admin, payload))]
pub async fn assign_rider(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRiderRequest>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let rider = payload.into_rider_ref()?;
    let outcome = state
        .lifecycle
        .assign_rider(id, rider, OffsetDateTime::now_utc())
        .await?;
    Ok(Json(AssignmentResponse::try_from(outcome)?))
}

#[instrument(skip(state, caller))]
pub async fn toggle_delivery(
    State(state): State<AppState>,
    caller: RiderOrAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<ParcelView>, AppError> {
    ensure_carrier(&state, &caller, id).await?;
    let parcel = state
        .lifecycle
        .toggle_delivery(id, OffsetDateTime::now_utc())
        .await?;
    Ok(Json(ParcelView::try_from(parcel)?))
}

#[instrument(skip(state, caller))]
pub async fn cashout(
    State(state): State<AppState>,
    caller: RiderOrAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<ParcelView>, AppError> {
    ensure_carrier(&state, &caller, id).await?;
    let parcel = state
        .lifecycle
        .cashout(id, OffsetDateTime::now_utc())
        .await?;
    Ok(Json(ParcelView::try_from(parcel)?))
}
