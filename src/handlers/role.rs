use axum::{
    extract::{Path, State},
    Extension, Json,
};
use http::StatusCode;
use sqlx::PgPool;
use tracing::instrument;

use crate::activity::{self, LogEntry};
use crate::dtos::common::required_text;
use crate::dtos::role::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};
use crate::error::{map_constraint, AppError};
use crate::middleware::auth::{AuthContext, ADMIN_ROLE};
use crate::models::role::Role;
use crate::state::AppState;

const SELECT_ROLE: &str = "SELECT r.id, r.name, r.description, r.created_at,
        COUNT(u.id)::BIGINT AS user_count
     FROM roles r
     LEFT JOIN users u ON u.role_id = r.id";

async fn fetch_role(db_pool: &PgPool, id: i64) -> Result<Role, AppError> {
    sqlx::query_as::<_, Role>(&format!("{SELECT_ROLE} WHERE r.id = $1 GROUP BY r.id"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Role not found"))
}

/// Role names are stored lower-case; tokens compare against them verbatim.
fn role_name(raw: &str) -> Result<String, AppError> {
    Ok(required_text(raw, "Role name")?.to_lowercase())
}

// GET /roles
#[instrument(skip(state))]
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<RoleResponse>>, AppError> {
    let roles = sqlx::query_as::<_, Role>(&format!("{SELECT_ROLE} GROUP BY r.id ORDER BY r.name"))
        .fetch_all(&state.db_pool)
        .await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

// POST /roles
#[instrument(skip(db_pool, auth, payload))]
pub async fn create_role(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), AppError> {
    auth.require_admin("create roles")?;
    let name = role_name(&payload.name)?;

    let mut tx = db_pool.begin().await?;
    let id = sqlx::query_scalar::<_, i64>("INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING id")
        .bind(&name)
        .bind(payload.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "Role name already exists", "Invalid role"))?;

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "create", "role", id, format!("Created role {name}"))).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(fetch_role(&db_pool, id).await?.into())))
}

// PUT /roles/{id}
#[instrument(skip(db_pool, auth, payload))]
pub async fn update_role(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<RoleResponse>, AppError> {
    auth.require_admin("update roles")?;
    let name = payload.name.as_deref().map(role_name).transpose()?;

    let mut tx = db_pool.begin().await?;
    let current = sqlx::query_scalar::<_, String>("SELECT name FROM roles WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Role not found"))?;
    // admin checks compare against this exact name
    if current == ADMIN_ROLE && name.as_deref().is_some_and(|n| n != ADMIN_ROLE) {
        return Err(AppError::conflict("The admin role cannot be renamed"));
    }

    sqlx::query("UPDATE roles SET name = COALESCE($1, name), description = COALESCE($2, description) WHERE id = $3")
        .bind(name)
        .bind(payload.description)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "Role name already exists", "Invalid role"))?;

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "update", "role", id, "Updated role")).await?;
    tx.commit().await?;

    Ok(Json(fetch_role(&db_pool, id).await?.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_normalized() {
        assert_eq!(role_name("  Manager ").unwrap(), "manager");
        assert!(role_name("").is_err());
    }
}
