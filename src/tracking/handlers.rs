use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::AddTrackingRequest,
    repo::{self, TrackingEvent},
};
use crate::{error::AppError, state::AppState};

pub fn tracking_routes() -> Router<AppState> {
    Router::new()
        .route("/tracking", post(add_event))
        .route("/tracking/:tracking_id", get(list_events))
}

#[instrument(skip(state))]
pub async fn add_event(
    State(state): State<AppState>,
    Json(payload): Json<AddTrackingRequest>,
) -> Result<(StatusCode, Json<TrackingEvent>), AppError> {
    let new = payload.into_event()?;
    let event = repo::append(&state.db, &new)
        .await?
        .ok_or(AppError::NotFound("parcel"))?;
    info!(tracking_id = %event.tracking_id, status = %event.status, "tracking event added");
    Ok((StatusCode::CREATED, Json(event)))
}

#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<Json<Vec<TrackingEvent>>, AppError> {
    Ok(Json(repo::list(&state.db, tracking_id.trim()).await?))
}
