use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use http::StatusCode;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, instrument};

use crate::activity::{self, LogEntry};
use crate::dtos::common::{amount, required_text};
use crate::dtos::product::{CreateProductRequest, ProductQuery, ProductResponse, UpdateProductRequest};
use crate::error::{is_violation, map_constraint, AppError, FOREIGN_KEY_VIOLATION};
use crate::middleware::auth::AuthContext;
use crate::models::product::Product;
use crate::state::AppState;

pub(crate) const SELECT_PRODUCT: &str = "SELECT p.id, p.name, p.sku, p.category_id,
        c.name AS category_name,
        p.cost_price::FLOAT8    AS cost_price,
        p.selling_price::FLOAT8 AS selling_price,
        p.stock, p.created_at
     FROM products p
     JOIN categories c ON c.id = p.category_id";

const UNIQUE_SKU: &str = "Product SKU already exists";
const UNKNOWN_CATEGORY: &str = "Category does not exist";

async fn fetch_product(db_pool: &PgPool, id: i64) -> Result<Product, AppError> {
    sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))
}

fn validate_stock(stock: i32) -> Result<i32, AppError> {
    if stock < 0 {
        return Err(AppError::validation("stock cannot be negative"));
    }
    Ok(stock)
}

// GET /products?category_id=&search=
#[instrument(skip(state))]
pub async fn get_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_PRODUCT);
    builder.push(" WHERE TRUE");
    if let Some(category_id) = query.category_id {
        builder.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        builder
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    builder.push(" ORDER BY p.name");

    match builder.build_query_as::<Product>().fetch_all(&state.db_pool).await {
        Ok(products) => Ok(Json(products.into_iter().map(ProductResponse::from).collect())),
        Err(e) => {
            error!(?e, "Failed to fetch products");
            Err(e.into())
        }
    }
}

// GET /products/{id}
#[instrument(skip(state))]
pub async fn get_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    Ok(Json(fetch_product(&state.db_pool, id).await?.into()))
}

// POST /products
#[instrument(skip(db_pool, auth, payload))]
pub async fn create_product(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let name = required_text(&payload.name, "Product name")?;
    let sku = required_text(&payload.sku, "SKU")?;
    let cost_price = amount(payload.cost_price, "cost_price")?;
    let selling_price = payload.selling_price.map(|s| amount(s, "selling_price")).transpose()?;
    let stock = validate_stock(payload.stock)?;

    let mut tx = db_pool.begin().await?;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products (name, sku, category_id, cost_price, selling_price, stock)
         VALUES ($1, $2, $3, $4::FLOAT8, $5::FLOAT8, $6) RETURNING id",
    )
    .bind(&name)
    .bind(&sku)
    .bind(payload.category.id())
    .bind(cost_price)
    .bind(selling_price)
    .bind(stock)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_constraint(e, UNIQUE_SKU, UNKNOWN_CATEGORY))?;

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "create", "product", id, format!("Created product {name} ({sku})"))).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(fetch_product(&db_pool, id).await?.into())))
}

// PUT /products/{id}
#[instrument(skip(db_pool, auth, payload))]
pub async fn update_product(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let name = payload.name.as_deref().map(|n| required_text(n, "Product name")).transpose()?;
    let sku = payload.sku.as_deref().map(|s| required_text(s, "SKU")).transpose()?;
    let cost_price = payload.cost_price.map(|c| amount(c, "cost_price")).transpose()?;
    let clear_or_set_price = payload.selling_price.is_some();
    let selling_price = payload.selling_price.flatten().map(|s| amount(s, "selling_price")).transpose()?;
    let stock = payload.stock.map(validate_stock).transpose()?;

    let mut tx = db_pool.begin().await?;
    sqlx::query_scalar::<_, i64>(
        "UPDATE products SET
         name = COALESCE($1, name),
         sku = COALESCE($2, sku),
         category_id = COALESCE($3, category_id),
         cost_price = COALESCE($4::FLOAT8, cost_price),
         selling_price = CASE WHEN $8 THEN $5::FLOAT8 ELSE selling_price END,
         stock = COALESCE($6, stock)
         WHERE id = $7 RETURNING id",
    )
    .bind(name)
    .bind(sku)
    .bind(payload.category.as_ref().map(|c| c.id()))
    .bind(cost_price)
    .bind(selling_price)
    .bind(stock)
    .bind(id)
    .bind(clear_or_set_price)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| map_constraint(e, UNIQUE_SKU, UNKNOWN_CATEGORY))?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "update", "product", id, "Updated product")).await?;
    tx.commit().await?;

    Ok(Json(fetch_product(&db_pool, id).await?.into()))
}

// DELETE /products/{id}
#[instrument(skip(db_pool, auth))]
pub async fn delete_product(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    let mut tx = db_pool.begin().await?;
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_violation(&e, FOREIGN_KEY_VIOLATION) {
                AppError::conflict("Product is referenced by a shipment")
            } else {
                AppError::db(e)
            }
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "delete", "product", id, "Deleted product")).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
