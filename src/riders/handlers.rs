use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        CashoutAllResponse, CompletedParcels, CreateRiderRequest, DecisionOutcome,
        DecisionRequest, DistrictQuery, FilterQuery, ReconcileResponse, RiderEmailQuery,
    },
    repo,
    repo_types::Rider,
    services,
};
use crate::{
    auth::{AdminUser, RiderOrAdmin, VerifiedUser},
    error::AppError,
    lifecycle::{EarningsSummary, RiderApproval},
    parcels::dto::ParcelView,
    state::AppState,
};

pub fn rider_routes() -> Router<AppState> {
    Router::new()
        .route("/riders", post(apply).get(list_by_district))
        .route("/riders/filter", get(filter_riders))
        .route("/riders/pending", get(pending_riders))
        .route("/riders/approved", get(approved_riders))
        .route("/riders/rejected", get(rejected_riders))
        .route("/riders/:id", patch(decide))
        .route("/riders/:id/reconcile", post(reconcile))
}

/// Endpoints a rider uses for their own deliveries.
pub fn self_service_routes() -> Router<AppState> {
    Router::new()
        .route("/rider/completed-parcels", get(completed_parcels))
        .route("/rider/earnings", get(earnings))
        .route("/rider/:email/cashout-all", patch(cashout_all))
}

#[instrument(skip(state, user, payload))]
pub async fn apply(
    State(state): State<AppState>,
    user: VerifiedUser,
    Json(payload): Json<CreateRiderRequest>,
) -> Result<(StatusCode, Json<Rider>), AppError> {
    let rider = services::apply(&state.db, &user.email, &payload).await?;
    Ok((StatusCode::CREATED, Json(rider)))
}

#[instrument(skip(state))]
pub async fn list_by_district(
    State(state): State<AppState>,
    Query(q): Query<DistrictQuery>,
) -> Result<Json<Vec<Rider>>, AppError> {
    if q.district.trim().is_empty() {
        return Err(AppError::InvalidInput("district is required".into()));
    }
    Ok(Json(repo::list_by_district(&state.db, &q.district).await?))
}

#[instrument(skip(state))]
pub async fn filter_riders(
    State(state): State<AppState>,
    Query(q): Query<FilterQuery>,
) -> Result<Json<Vec<Rider>>, AppError> {
    Ok(Json(repo::filter(&state.db, q.status, q.rider_status).await?))
}

async fn by_approval(state: &AppState, status: RiderApproval) -> Result<Json<Vec<Rider>>, AppError> {
    Ok(Json(repo::filter(&state.db, Some(status), None).await?))
}

#[instrument(skip(state, _admin))]
pub async fn pending_riders(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Rider>>, AppError> {
    by_approval(&state, RiderApproval::Pending).await
}

#[instrument(skip(state, _admin))]
pub async fn approved_riders(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Rider>>, AppError> {
    by_approval(&state, RiderApproval::Accepted).await
}

#[instrument(skip(state, _admin))]
pub async fn rejected_riders(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Rider>>, AppError> {
    by_approval(&state, RiderApproval::Rejected).await
}

#[instrument(skip(state, admin, payload))]
pub async fn decide(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<DecisionOutcome>, AppError> {
    let outcome = services::decide(&state.db, id, &payload.status).await?;
    info!(admin = %admin.0.email, rider_id = %id, "rider decision recorded");
    Ok(Json(outcome))
}

#[instrument(skip(state, _admin))]
pub async fn reconcile(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReconcileResponse>, AppError> {
    let rider_status = state.lifecycle.reconcile_rider(id).await?;
    Ok(Json(ReconcileResponse {
        rider_id: id,
        rider_status,
    }))
}

#[instrument(skip(state, caller))]
pub async fn completed_parcels(
    State(state): State<AppState>,
    caller: RiderOrAdmin,
    Query(q): Query<RiderEmailQuery>,
) -> Result<Json<CompletedParcels>, AppError> {
    caller.ensure_acts_for(&q.email)?;
    let (parcels, summary) = state.lifecycle.rider_earnings(&q.email).await?;
    let parcels = parcels
        .into_iter()
        .map(ParcelView::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(CompletedParcels { parcels, summary }))
}

#[instrument(skip(state, caller))]
pub async fn earnings(
    State(state): State<AppState>,
    caller: RiderOrAdmin,
    Query(q): Query<RiderEmailQuery>,
) -> Result<Json<EarningsSummary>, AppError> {
    caller.ensure_acts_for(&q.email)?;
    let (_, summary) = state.lifecycle.rider_earnings(&q.email).await?;
    Ok(Json(summary))
}

#[instrument(skip(state, caller))]
pub async fn cashout_all(
    State(state): State<AppState>,
    caller: RiderOrAdmin,
    Path(email): Path<String>,
) -> Result<Json<CashoutAllResponse>, AppError> {
    caller.ensure_acts_for(&email)?;
    let modified = state
        .lifecycle
        .cashout_all(&email, OffsetDateTime::now_utc())
        .await?;
    Ok(Json(CashoutAllResponse { modified }))
}
