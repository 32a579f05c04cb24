use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        ChangeRoleRequest, CreateUserRequest, CreateUserResponse, RoleChange, RoleResponse,
        SearchQuery,
    },
    repo,
    repo_types::User,
    services,
};
use crate::{
    auth::{AdminUser, VerifiedUser},
    error::AppError,
    state::AppState,
};

const SEARCH_LIMIT: i64 = 10;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/search", get(search_users))
        .route("/users/role/:email", get(get_role))
        .route("/users/:id/role", patch(change_role))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), AppError> {
    let (user, inserted) =
        services::register(&state.db, &payload.email, payload.name.as_deref()).await?;
    let status = if inserted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(CreateUserResponse { inserted, user })))
}

#[instrument(skip(state, admin))]
pub async fn search_users(
    State(state): State<AppState>,
    admin: AdminUser,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    let term = q.email.trim();
    if term.is_empty() {
        return Err(AppError::InvalidInput("email query is required".into()));
    }
    let users = repo::search(&state.db, term, SEARCH_LIMIT).await?;
    if users.is_empty() {
        return Err(AppError::NotFound("user"));
    }
    info!(admin = %admin.0.email, term, found = users.len(), "user search");
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn get_role(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<RoleResponse>, AppError> {
    let email = email.trim().to_lowercase();
    let role = repo::role_of(&state.db, &email)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(RoleResponse { role }))
}

#[instrument(skip(state, admin, payload))]
pub async fn change_role(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<RoleChange>, AppError> {
    let change = services::change_role(&state.db, id, &payload.role).await?;
    info!(admin = %admin.0.email, user_id = %id, role = %change.role, "role change applied");
    Ok(Json(change))
}

#[instrument(skip(state, user))]
pub async fn get_me(
    State(state): State<AppState>,
    user: VerifiedUser,
) -> Result<Json<User>, AppError> {
    let me = repo::find_by_email(&state.db, &user.email)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(me))
}
