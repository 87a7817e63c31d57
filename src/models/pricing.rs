use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct PricingCalculation {
    pub id: i64,
    pub shipping_id: Option<i64>,
    pub shipping_name: Option<String>,
    pub shipping_cost: f64,
    pub import_tax: f64,
    pub other_costs: f64,
    pub other_cost_type: String,
    pub markup_percent: f64,
    pub base_cost: f64,
    pub other_costs_amount: f64,
    pub total_cost: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct PricingProduct {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub landed_unit_cost: f64,
    pub selling_price: f64,
    pub profit: f64,
    pub margin: f64,
}
