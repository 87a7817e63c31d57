use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use http::StatusCode;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use crate::activity::{self, LogEntry};
use crate::calc::shipment_status::{delivery_status, ShippingStatus};
use crate::dtos::common::{amount, required_text};
use crate::dtos::shipping::{
    CreateShippingRequest, ShippingItemRequest, ShippingItemResponse, ShippingResponse, UpdateShippingRequest,
};
use crate::error::{is_violation, AppError, FOREIGN_KEY_VIOLATION};
use crate::middleware::auth::AuthContext;
use crate::models::shipping::{Shipping, ShippingItem};
use crate::state::AppState;

const SELECT_SHIPPING: &str = "SELECT id, name, arrival_date, carrier, tracking_number, status, delivered_at, created_at
     FROM shippings";

pub(crate) const SELECT_ITEMS: &str = "SELECT si.id, si.shipping_id, si.product_id,
        p.name AS product_name,
        p.selling_price::FLOAT8 AS product_selling_price,
        si.quantity,
        si.unit_price::FLOAT8 AS unit_price
     FROM shipping_items si
     JOIN products p ON p.id = si.product_id";

async fn fetch_items(db_pool: &PgPool, shipping_ids: &[i64]) -> Result<HashMap<i64, Vec<ShippingItem>>, AppError> {
    let rows = sqlx::query_as::<_, ShippingItem>(&format!(
        "{SELECT_ITEMS} WHERE si.shipping_id = ANY($1) ORDER BY si.id"
    ))
    .bind(shipping_ids)
    .fetch_all(db_pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<ShippingItem>> = HashMap::new();
    for row in rows {
        grouped.entry(row.shipping_id).or_default().push(row);
    }
    Ok(grouped)
}

/// Delivered shipments are judged against the moment they were delivered, everything else
/// against `now`.
fn to_response(row: Shipping, items: Vec<ShippingItem>, now: DateTime<Utc>) -> Result<ShippingResponse, AppError> {
    let status = row.status()?;
    let reference = match status {
        ShippingStatus::Delivered => row.delivered_at.unwrap_or(now),
        _ => now,
    };
    let delivery = delivery_status(row.arrival_date, status, reference);
    let items: Vec<ShippingItemResponse> = items.into_iter().map(ShippingItemResponse::from).collect();
    let items_total: f64 = items.iter().map(|i| i.line_total).sum();

    Ok(ShippingResponse {
        id: row.id,
        name: row.name,
        arrival_date: row.arrival_date,
        carrier: row.carrier,
        tracking_number: row.tracking_number,
        status,
        delivered_at: row.delivered_at,
        delivery,
        items,
        items_total,
        created_at: row.created_at,
    })
}

async fn fetch_shipping(db_pool: &PgPool, id: i64, now: DateTime<Utc>) -> Result<ShippingResponse, AppError> {
    let row = sqlx::query_as::<_, Shipping>(&format!("{SELECT_SHIPPING} WHERE id = $1"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Shipping not found"))?;
    let items = fetch_items(db_pool, &[id]).await?.remove(&id).unwrap_or_default();
    to_response(row, items, now)
}

fn validate_items(items: &[ShippingItemRequest]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::validation("Shipping must have at least one item"));
    }
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::validation("quantity must be greater than 0"));
        }
        amount(item.unit_price, "unit_price")?;
    }
    Ok(())
}

/// Clients never set `delivered` directly.
fn reject_delivered_input(status: Option<ShippingStatus>) -> Result<(), AppError> {
    if status == Some(ShippingStatus::Delivered) {
        return Err(AppError::validation("Use confirm-delivery to mark a shipping as delivered"));
    }
    Ok(())
}

/// Delivered shipments are closed; `message` says which change was refused.
fn ensure_open(status: ShippingStatus, message: &str) -> Result<(), AppError> {
    if status == ShippingStatus::Delivered {
        return Err(AppError::conflict(message));
    }
    Ok(())
}

async fn insert_items(conn: &mut PgConnection, shipping_id: i64, items: &[ShippingItemRequest]) -> Result<(), AppError> {
    for item in items {
        sqlx::query(
            "INSERT INTO shipping_items (shipping_id, product_id, quantity, unit_price)
             VALUES ($1, $2, $3, $4::FLOAT8)",
        )
        .bind(shipping_id)
        .bind(item.product.id())
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_violation(&e, FOREIGN_KEY_VIOLATION) {
                AppError::validation(format!("Product {} does not exist", item.product.id()))
            } else {
                AppError::db(e)
            }
        })?;
    }
    Ok(())
}

async fn lock_status(conn: &mut PgConnection, id: i64) -> Result<ShippingStatus, AppError> {
    let raw = sqlx::query_scalar::<_, String>("SELECT status FROM shippings WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("Shipping not found"))?;
    raw.parse().map_err(AppError::internal)
}

// GET /shippings
#[instrument(skip(state))]
pub async fn list_shippings(State(state): State<AppState>) -> Result<Json<Vec<ShippingResponse>>, AppError> {
    // one instant for the whole list so every countdown agrees
    let now = Utc::now();
    let rows = sqlx::query_as::<_, Shipping>(&format!("{SELECT_SHIPPING} ORDER BY arrival_date DESC, id DESC"))
        .fetch_all(&state.db_pool)
        .await?;

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut items = fetch_items(&state.db_pool, &ids).await?;

    let response = rows
        .into_iter()
        .map(|row| {
            let row_items = items.remove(&row.id).unwrap_or_default();
            to_response(row, row_items, now)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(response))
}

// GET /shippings/{id}
#[instrument(skip(state))]
pub async fn get_shipping(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ShippingResponse>, AppError> {
    Ok(Json(fetch_shipping(&state.db_pool, id, Utc::now()).await?))
}

// POST /shippings
#[instrument(skip(db_pool, auth, req))]
pub async fn create_shipping(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateShippingRequest>,
) -> Result<(StatusCode, Json<ShippingResponse>), AppError> {
    let name = required_text(&req.name, "Shipping name")?;
    reject_delivered_input(Some(req.status))?;
    validate_items(&req.items)?;

    let mut tx = db_pool.begin().await?;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO shippings (name, arrival_date, carrier, tracking_number, status)
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&name)
    .bind(req.arrival_date)
    .bind(req.carrier.trim())
    .bind(req.tracking_number.trim())
    .bind(req.status.as_str())
    .fetch_one(&mut *tx)
    .await?;

    insert_items(&mut tx, id, &req.items).await?;
    activity::record(
        &mut *tx,
        LogEntry::info(auth.user_id, "create", "shipping", id, format!("Created shipping {name} with {} items", req.items.len())),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(id, "Shipping created");
    Ok((StatusCode::CREATED, Json(fetch_shipping(&db_pool, id, Utc::now()).await?)))
}

// PUT /shippings/{id}
#[instrument(skip(db_pool, auth, req))]
pub async fn update_shipping(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateShippingRequest>,
) -> Result<Json<ShippingResponse>, AppError> {
    let name = req.name.as_deref().map(|n| required_text(n, "Shipping name")).transpose()?;
    reject_delivered_input(req.status)?;
    if let Some(items) = &req.items {
        validate_items(items)?;
    }

    let mut tx = db_pool.begin().await?;
    ensure_open(lock_status(&mut tx, id).await?, "Delivered shippings cannot be edited")?;

    sqlx::query(
        "UPDATE shippings SET
         name = COALESCE($1, name),
         arrival_date = COALESCE($2, arrival_date),
         carrier = COALESCE($3, carrier),
         tracking_number = COALESCE($4, tracking_number),
         status = COALESCE($5, status)
         WHERE id = $6",
    )
    .bind(name)
    .bind(req.arrival_date)
    .bind(req.carrier.as_deref().map(str::trim))
    .bind(req.tracking_number.as_deref().map(str::trim))
    .bind(req.status.map(|s| s.as_str()))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if let Some(items) = &req.items {
        sqlx::query("DELETE FROM shipping_items WHERE shipping_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, id, items).await?;
    }

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "update", "shipping", id, "Updated shipping")).await?;
    tx.commit().await?;

    Ok(Json(fetch_shipping(&db_pool, id, Utc::now()).await?))
}

// POST /shippings/{id}/confirm-delivery
#[instrument(skip(db_pool, auth))]
pub async fn confirm_delivery(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ShippingResponse>, AppError> {
    let mut tx = db_pool.begin().await?;
    ensure_open(lock_status(&mut tx, id).await?, "Shipping is already delivered")?;

    let name = sqlx::query_scalar::<_, String>(
        "UPDATE shippings SET status = 'delivered', delivered_at = now() WHERE id = $1 RETURNING name",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    // received goods go into stock
    let restocked = sqlx::query(
        "UPDATE products p SET stock = p.stock + s.qty
         FROM (SELECT product_id, SUM(quantity)::INT AS qty
               FROM shipping_items WHERE shipping_id = $1
               GROUP BY product_id) s
         WHERE p.id = s.product_id",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    activity::record(
        &mut *tx,
        LogEntry::info(auth.user_id, "deliver", "shipping", id, format!("Confirmed delivery of {name}, restocked {restocked} products")),
    )
    .await?;
    activity::notify(&mut *tx, None, "Shipping delivered", &format!("{name} was confirmed as delivered")).await?;
    tx.commit().await?;

    tracing::info!(id, restocked, "Shipping delivered");
    Ok(Json(fetch_shipping(&db_pool, id, Utc::now()).await?))
}

// DELETE /shippings/{id}
#[instrument(skip(db_pool, auth))]
pub async fn delete_shipping(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    let mut tx = db_pool.begin().await?;
    let result = sqlx::query("DELETE FROM shippings WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Shipping not found"));
    }

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "delete", "shipping", id, "Deleted shipping")).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
