use axum::{extract::State, Extension, Json};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::instrument;

use crate::calc::format::{format_currency, format_percent};
use crate::calc::margin::{average_margin, bucket_counts, margin_buckets};
use crate::calc::metrics::{category_share, inventory_value, status_tally, PRICE_BOUNDARIES};
use crate::calc::shipment_status::{delivery_status, ShippingStatus};
use crate::dtos::dashboard::DashboardSummary;
use crate::error::AppError;
use crate::handlers::notification::unread_count;
use crate::handlers::product::SELECT_PRODUCT;
use crate::middleware::auth::AuthContext;
use crate::models::product::{PricedProduct, Product};
use crate::state::AppState;

#[derive(sqlx::FromRow)]
struct ShipmentStatusRow {
    arrival_date: NaiveDate,
    status: String,
    delivered_at: Option<DateTime<Utc>>,
}

// GET /dashboard/summary
#[instrument(skip(state, auth))]
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<DashboardSummary>, AppError> {
    let now = Utc::now();

    let products = sqlx::query_as::<_, Product>(SELECT_PRODUCT)
        .fetch_all(&state.db_pool)
        .await?;

    let categories = sqlx::query_as::<_, (i64, String, i64)>(
        "SELECT c.id, c.name, COUNT(p.id)::BIGINT
         FROM categories c
         LEFT JOIN products p ON p.category_id = c.id
         GROUP BY c.id ORDER BY c.name",
    )
    .fetch_all(&state.db_pool)
    .await?;

    let shipments = sqlx::query_as::<_, ShipmentStatusRow>("SELECT arrival_date, status, delivered_at FROM shippings")
        .fetch_all(&state.db_pool)
        .await?;

    let unread = unread_count(&state.db_pool, auth.user_id).await?;

    let summary = summarize(&products, &categories, &shipments, unread, now, &state.config.currency_symbol)?;
    Ok(Json(summary))
}

fn summarize(
    products: &[Product],
    categories: &[(i64, String, i64)],
    shipments: &[ShipmentStatusRow],
    unread_notifications: i64,
    now: DateTime<Utc>,
    currency_symbol: &str,
) -> Result<DashboardSummary, AppError> {
    let priced: Vec<PricedProduct<'_>> = products
        .iter()
        .filter_map(|p| p.selling_price.map(|s| PricedProduct(p, s)))
        .collect();
    let avg_margin = average_margin(&priced);

    let stock: Vec<(f64, i32)> = products.iter().map(|p| (p.cost_price, p.stock)).collect();
    let value = inventory_value(&stock);

    let statuses = shipments
        .iter()
        .map(|s| {
            let status: ShippingStatus = s.status.parse().map_err(AppError::internal)?;
            let reference = match status {
                ShippingStatus::Delivered => s.delivered_at.unwrap_or(now),
                _ => now,
            };
            Ok(delivery_status(s.arrival_date, status, reference).status)
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(DashboardSummary {
        product_count: products.len(),
        category_count: categories.len(),
        priced_product_count: priced.len(),
        total_stock: products.iter().map(|p| p.stock as i64).sum(),
        inventory_value: value,
        inventory_value_display: format_currency(value, currency_symbol),
        average_margin: avg_margin,
        average_margin_display: format_percent(avg_margin, 1),
        margin_buckets: margin_buckets(&priced),
        price_distribution: bucket_counts(priced.iter().map(|p| p.1), &PRICE_BOUNDARIES),
        category_share: category_share(categories),
        shipments: status_tally(statuses),
        unread_notifications,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn product(id: i64, category_id: i64, cost: f64, selling: Option<f64>, stock: i32) -> Product {
        Product {
            id,
            name: format!("Product {id}"),
            sku: format!("SKU-{id}"),
            category_id,
            category_name: format!("Category {category_id}"),
            cost_price: cost,
            selling_price: selling,
            stock,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_summarize() {
        let products = vec![
            product(1, 1, 8.0, Some(10.0), 5),   // margin 20
            product(2, 1, 90.0, Some(100.0), 1), // margin 10
            product(3, 2, 4.0, None, 10),
        ];
        let categories = vec![(1, "Tea".to_string(), 2), (2, "Cups".to_string(), 1)];
        let shipments = vec![
            ShipmentStatusRow {
                arrival_date: (now() - Duration::days(2)).date_naive(),
                status: "processing".into(),
                delivered_at: None,
            },
            ShipmentStatusRow {
                arrival_date: (now() + Duration::days(4)).date_naive(),
                status: "pending".into(),
                delivered_at: None,
            },
            ShipmentStatusRow {
                arrival_date: (now() - Duration::days(20)).date_naive(),
                status: "delivered".into(),
                delivered_at: Some(now() - Duration::days(21)),
            },
        ];

        let s = summarize(&products, &categories, &shipments, 3, now(), "$").unwrap();
        assert_eq!(s.product_count, 3);
        assert_eq!(s.priced_product_count, 2);
        assert_eq!(s.total_stock, 16);
        assert_eq!(s.inventory_value, 170.0);
        assert_eq!(s.inventory_value_display, "$170.00");
        assert!((s.average_margin - 15.0).abs() < 1e-9);
        assert_eq!(s.average_margin_display, "15.0%");
        assert_eq!(s.margin_buckets.iter().map(|b| b.count).collect::<Vec<_>>(), vec![1, 0, 1, 0]);
        assert_eq!(s.price_distribution.iter().map(|b| b.count).collect::<Vec<_>>(), vec![0, 1, 0, 1]);
        assert!((s.category_share[0].share_percent - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.shipments.overdue, 1);
        assert_eq!(s.shipments.pending, 1);
        assert_eq!(s.shipments.delivered, 1);
        assert_eq!(s.unread_notifications, 3);
    }

    #[test]
    fn test_summarize_empty() {
        let s = summarize(&[], &[], &[], 0, now(), "$").unwrap();
        assert_eq!(s.average_margin, 0.0);
        assert_eq!(s.margin_buckets.iter().map(|b| b.count).sum::<usize>(), 0);
        assert_eq!(s.inventory_value_display, "$0.00");
    }
}
