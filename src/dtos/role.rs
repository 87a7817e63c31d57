use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub user_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::role::Role> for RoleResponse {
    fn from(role: crate::models::role::Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            user_count: role.user_count,
            created_at: role.created_at,
        }
    }
}
