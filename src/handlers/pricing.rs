use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use http::StatusCode;
use sqlx::PgPool;
use tracing::instrument;

use crate::activity::{self, LogEntry};
use crate::calc::format::format_currency;
use crate::calc::margin;
use crate::calc::pricing::{self, CostBreakdown, CostInputs, LineItem, OtherCostType, PricedLine, ProductPricing};
use crate::dtos::common::EntitySummary;
use crate::dtos::pricing::{CreatePricingRequest, PricingProductResponse, PricingResponse, PricingSummary};
use crate::error::AppError;
use crate::handlers::shipping::SELECT_ITEMS;
use crate::middleware::auth::AuthContext;
use crate::models::pricing::{PricingCalculation, PricingProduct};
use crate::models::shipping::ShippingItem;
use crate::state::AppState;

struct Computed {
    inputs: CostInputs,
    breakdown: CostBreakdown,
    markup_percent: f64,
    shipping: Option<EntitySummary>,
    products: Vec<ProductPricing>,
}

/// Loads the shipment lines (if any) and runs the cost aggregation and allocation.
async fn compute(db_pool: &PgPool, req: &CreatePricingRequest, default_markup: f64) -> Result<Computed, AppError> {
    let inputs = req.cost_inputs()?;
    let markup_percent = req.markup_or(default_markup)?;

    let (shipping, lines) = match req.shipping {
        Some(shipping_id) => {
            let name = sqlx::query_scalar::<_, String>("SELECT name FROM shippings WHERE id = $1")
                .bind(shipping_id)
                .fetch_optional(db_pool)
                .await?
                .ok_or_else(|| AppError::validation(format!("Shipping {shipping_id} does not exist")))?;
            let items = sqlx::query_as::<_, ShippingItem>(&format!("{SELECT_ITEMS} WHERE si.shipping_id = $1 ORDER BY si.id"))
                .bind(shipping_id)
                .fetch_all(db_pool)
                .await?;
            let lines: Vec<PricedLine> = items
                .into_iter()
                .map(|i| PricedLine {
                    product_id: i.product_id,
                    product_name: i.product_name,
                    item: LineItem { quantity: i.quantity, unit_price: i.unit_price },
                    listed_selling_price: i.product_selling_price,
                })
                .collect();
            (Some(EntitySummary { id: shipping_id, name }), lines)
        }
        None => (None, Vec::new()),
    };

    let items: Vec<LineItem> = lines.iter().map(|l| l.item).collect();
    let breakdown = pricing::calculate(&items, &inputs);
    let products = pricing::allocate(&lines, &breakdown, markup_percent);

    Ok(Computed { inputs, breakdown, markup_percent, shipping, products })
}

// POST /pricing/preview
#[instrument(skip(state, req))]
pub async fn preview_pricing(
    State(state): State<AppState>,
    Json(req): Json<CreatePricingRequest>,
) -> Result<Json<PricingResponse>, AppError> {
    let c = compute(&state.db_pool, &req, state.config.default_markup_percent).await?;
    Ok(Json(PricingResponse::from_breakdown(&c.inputs, &c.breakdown, c.markup_percent, c.shipping, c.products)))
}

// POST /pricing
#[instrument(skip(state, auth, req))]
pub async fn create_pricing(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePricingRequest>,
) -> Result<(StatusCode, Json<PricingResponse>), AppError> {
    let c = compute(&state.db_pool, &req, state.config.default_markup_percent).await?;

    let mut tx = state.db_pool.begin().await?;
    let (id, created_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
        "INSERT INTO pricing_calculations
            (shipping_id, shipping_cost, import_tax, other_costs, other_cost_type, markup_percent,
             base_cost, other_costs_amount, total_cost, created_by)
         VALUES ($1, $2::FLOAT8, $3::FLOAT8, $4::FLOAT8, $5, $6::FLOAT8,
                 ROUND($7::FLOAT8::NUMERIC, 2), ROUND($8::FLOAT8::NUMERIC, 2), ROUND($9::FLOAT8::NUMERIC, 2), $10)
         RETURNING id, created_at",
    )
    .bind(c.shipping.as_ref().map(|s| s.id))
    .bind(c.inputs.shipping_cost)
    .bind(c.inputs.import_tax)
    .bind(c.inputs.other_costs)
    .bind(c.inputs.other_cost_type.as_str())
    .bind(c.markup_percent)
    .bind(c.breakdown.base_cost)
    .bind(c.breakdown.other_costs_amount)
    .bind(c.breakdown.total_cost)
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    for p in &c.products {
        sqlx::query(
            "INSERT INTO pricing_products
                (calculation_id, product_id, product_name, quantity, unit_price, landed_unit_cost,
                 selling_price, profit, margin)
             VALUES ($1, $2, $3, $4, $5::FLOAT8, ROUND($6::FLOAT8::NUMERIC, 4),
                     ROUND($7::FLOAT8::NUMERIC, 2), ROUND($8::FLOAT8::NUMERIC, 4), ROUND($9::FLOAT8::NUMERIC, 2))",
        )
        .bind(id)
        .bind(p.product_id)
        .bind(&p.product_name)
        .bind(p.quantity)
        .bind(p.unit_price)
        .bind(p.landed_unit_cost)
        .bind(p.selling_price)
        .bind(p.profit)
        .bind(p.margin)
        .execute(&mut *tx)
        .await?;
    }

    let total = format_currency(c.breakdown.total_cost, &state.config.currency_symbol);
    let subject = c.shipping.as_ref().map(|s| s.name.as_str()).unwrap_or("manual entry");
    activity::record(
        &mut *tx,
        LogEntry::info(auth.user_id, "create", "pricing", id, format!("Pricing calculation for {subject}: total {total}")),
    )
    .await?;
    activity::notify(
        &mut *tx,
        Some(auth.user_id),
        "Pricing calculated",
        &format!("Calculation #{id} for {subject} came to {total}"),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(id, total_cost = c.breakdown.total_cost, "Pricing calculation stored");

    let mut response = PricingResponse::from_breakdown(&c.inputs, &c.breakdown, c.markup_percent, c.shipping, c.products);
    response.id = Some(id);
    response.created_at = Some(created_at);
    Ok((StatusCode::CREATED, Json(response)))
}

// GET /pricing
#[instrument(skip(state))]
pub async fn list_pricing(State(state): State<AppState>) -> Result<Json<Vec<PricingSummary>>, AppError> {
    let rows = sqlx::query_as::<_, PricingSummaryRow>(
        "SELECT pc.id, pc.shipping_id, s.name AS shipping_name, pc.other_cost_type,
                pc.total_cost::FLOAT8 AS total_cost,
                COUNT(pp.id)::BIGINT AS product_count,
                pc.created_at
         FROM pricing_calculations pc
         LEFT JOIN shippings s ON s.id = pc.shipping_id
         LEFT JOIN pricing_products pp ON pp.calculation_id = pc.id
         GROUP BY pc.id, s.name
         ORDER BY pc.created_at DESC, pc.id DESC",
    )
    .fetch_all(&state.db_pool)
    .await?;

    let summaries = rows
        .into_iter()
        .map(|r| {
            Ok(PricingSummary {
                id: r.id,
                shipping: summary(r.shipping_id, r.shipping_name),
                other_cost_type: parse_cost_type(&r.other_cost_type)?,
                total_cost: r.total_cost,
                product_count: r.product_count,
                created_at: r.created_at,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;
    Ok(Json(summaries))
}

// GET /pricing/{id}
#[instrument(skip(state))]
pub async fn get_pricing(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<PricingResponse>, AppError> {
    let calc = sqlx::query_as::<_, PricingCalculation>(
        "SELECT pc.id, pc.shipping_id, s.name AS shipping_name,
                pc.shipping_cost::FLOAT8      AS shipping_cost,
                pc.import_tax::FLOAT8         AS import_tax,
                pc.other_costs::FLOAT8        AS other_costs,
                pc.other_cost_type,
                pc.markup_percent::FLOAT8     AS markup_percent,
                pc.base_cost::FLOAT8          AS base_cost,
                pc.other_costs_amount::FLOAT8 AS other_costs_amount,
                pc.total_cost::FLOAT8         AS total_cost,
                pc.created_at
         FROM pricing_calculations pc
         LEFT JOIN shippings s ON s.id = pc.shipping_id
         WHERE pc.id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Pricing calculation not found"))?;

    let products = sqlx::query_as::<_, PricingProduct>(
        "SELECT product_id, product_name, quantity,
                unit_price::FLOAT8       AS unit_price,
                landed_unit_cost::FLOAT8 AS landed_unit_cost,
                selling_price::FLOAT8    AS selling_price,
                profit::FLOAT8           AS profit,
                margin::FLOAT8           AS margin
         FROM pricing_products WHERE calculation_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(stored_response(calc, products)?))
}

// DELETE /pricing/{id}
#[instrument(skip(db_pool, auth))]
pub async fn delete_pricing(
    Path(id): Path<i64>,
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_admin("delete pricing calculations")?;

    let mut tx = db_pool.begin().await?;
    let result = sqlx::query("DELETE FROM pricing_calculations WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Pricing calculation not found"));
    }

    activity::record(&mut *tx, LogEntry::info(auth.user_id, "delete", "pricing", id, "Deleted pricing calculation")).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

fn summary(id: Option<i64>, name: Option<String>) -> Option<EntitySummary> {
    id.map(|id| EntitySummary { id, name: name.unwrap_or_default() })
}

fn parse_cost_type(raw: &str) -> Result<OtherCostType, AppError> {
    raw.parse().map_err(AppError::internal)
}

fn stored_response(calc: PricingCalculation, products: Vec<PricingProduct>) -> Result<PricingResponse, AppError> {
    Ok(PricingResponse {
        id: Some(calc.id),
        shipping: summary(calc.shipping_id, calc.shipping_name),
        average_margin: margin::mean(products.iter().map(|p| p.margin)),
        products: products.into_iter().map(PricingProductResponse::from).collect(),
        shipping_cost: calc.shipping_cost,
        import_tax: calc.import_tax,
        other_costs: calc.other_costs,
        other_cost_type: parse_cost_type(&calc.other_cost_type)?,
        markup_percent: calc.markup_percent,
        base_cost: calc.base_cost,
        other_costs_amount: calc.other_costs_amount,
        total_cost: calc.total_cost,
        created_at: Some(calc.created_at),
    })
}

#[derive(sqlx::FromRow)]
struct PricingSummaryRow {
    id: i64,
    shipping_id: Option<i64>,
    shipping_name: Option<String>,
    other_cost_type: String,
    total_cost: f64,
    product_count: i64,
    created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc_row(other_cost_type: &str) -> PricingCalculation {
        PricingCalculation {
            id: 11,
            shipping_id: Some(4),
            shipping_name: Some("Autumn order".into()),
            shipping_cost: 3.0,
            import_tax: 2.0,
            other_costs: 10.0,
            other_cost_type: other_cost_type.into(),
            markup_percent: 30.0,
            base_cost: 25.0,
            other_costs_amount: 2.5,
            total_cost: 32.5,
            created_at: Utc::now(),
        }
    }

    fn product_row(margin: f64, selling_price: f64, profit: f64) -> PricingProduct {
        PricingProduct {
            product_id: Some(2),
            product_name: "Oolong".into(),
            quantity: 2,
            unit_price: 10.0,
            landed_unit_cost: 13.0,
            selling_price,
            profit,
            margin,
        }
    }

    #[test]
    fn test_stored_response() {
        let res = stored_response(calc_row("percentage"), vec![product_row(20.0, 20.0, 4.0), product_row(10.0, 10.0, 1.0)]).unwrap();
        assert_eq!(res.id, Some(11));
        assert_eq!(res.other_cost_type, OtherCostType::Percentage);
        assert_eq!(res.shipping.as_ref().map(|s| s.id), Some(4));
        assert!((res.average_margin - 15.0).abs() < 1e-9);
        assert_eq!(res.products.len(), 2);
    }

    #[test]
    fn test_stored_response_rejects_unknown_cost_type() {
        assert!(stored_response(calc_row("weird"), vec![]).is_err());
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_unknown_shipping_is_rejected(pool: PgPool) {
        let req: CreatePricingRequest = serde_json::from_value(serde_json::json!({
            "shipping": 999, "shipping_cost": 1, "import_tax": 0, "other_costs": 0
        }))
        .unwrap();
        let res = compute(&pool, &req, 30.0).await;
        assert!(matches!(res, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_summary_requires_id() {
        assert!(summary(None, Some("gone".into())).is_none());
        assert_eq!(summary(Some(3), None).map(|s| s.name), Some(String::new()));
    }
}
