use axum::{
    extract::{Path, State},
    Extension, Json,
};
use http::StatusCode;
use sqlx::PgPool;
use tracing::instrument;

use crate::activity::{self, LogEntry};
use crate::dtos::category::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};
use crate::dtos::common::required_text;
use crate::error::{is_violation, map_constraint, AppError, FOREIGN_KEY_VIOLATION};
use crate::middleware::auth::AuthContext;
use crate::models::category::Category;
use crate::state::AppState;

const SELECT_CATEGORY: &str = "SELECT c.id, c.name, c.description, c.created_at,
        COUNT(p.id)::BIGINT AS product_count
     FROM categories c
     LEFT JOIN products p ON p.category_id = c.id";

async fn fetch_category(db_pool: &PgPool, id: i64) -> Result<Category, AppError> {
    sqlx::query_as::<_, Category>(&format!("{SELECT_CATEGORY} WHERE c.id = $1 GROUP BY c.id"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))
}

// GET /categories
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = sqlx::query_as::<_, Category>(&format!("{SELECT_CATEGORY} GROUP BY c.id ORDER BY c.name"))
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

// GET /categories/{id}
#[instrument(skip(state))]
pub async fn get_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CategoryResponse>, AppError> {
    Ok(Json(fetch_category(&state.db_pool, id).await?.into()))
}

// POST /categories
#[instrument(skip(db_pool, auth, payload))]
pub async fn create_category(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let name = required_text(&payload.name, "Category name")?;

    let mut tx = db_pool.begin().await?;
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, description) VALUES ($1, $2)
         RETURNING id, name, description, created_at, 0::BIGINT AS product_count",
    )
    .bind(&name)
    .bind(payload.description.as_deref().map(str::trim))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_constraint(e, "Category name already exists", "Invalid category"))?;

    activity::record(
        &mut *tx,
        LogEntry::info(auth.user_id, "create", "category", category.id, format!("Created category {name}")),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(id = category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category.into())))
}

// PUT /categories/{id}
#[instrument(skip(db_pool, auth, payload))]
pub async fn update_category(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    let name = payload.name.as_deref().map(|n| required_text(n, "Category name")).transpose()?;

    let mut tx = db_pool.begin().await?;
    let updated = sqlx::query_scalar::<_, i64>(
        "UPDATE categories SET
         name = COALESCE($1, name),
         description = COALESCE($2, description)
         WHERE id = $3 RETURNING id",
    )
    .bind(name)
    .bind(payload.description)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| map_constraint(e, "Category name already exists", "Invalid category"))?
    .ok_or_else(|| AppError::not_found("Category not found"))?;

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "update", "category", updated, "Updated category")).await?;
    tx.commit().await?;

    Ok(Json(fetch_category(&db_pool, id).await?.into()))
}

// DELETE /categories/{id}
#[instrument(skip(db_pool, auth))]
pub async fn delete_category(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    let mut tx = db_pool.begin().await?;
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_violation(&e, FOREIGN_KEY_VIOLATION) {
                AppError::conflict("Category is still used by products")
            } else {
                AppError::db(e)
            }
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Category not found"));
    }

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "delete", "category", id, "Deleted category")).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
