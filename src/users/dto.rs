use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::User;
use crate::lifecycle::Role;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub inserted: bool,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct RoleChange {
    pub id: Uuid,
    pub email: String,
    pub previous: Role,
    pub role: Role,
}
