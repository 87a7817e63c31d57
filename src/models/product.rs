use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::calc::margin::Priced;

#[derive(Debug, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub category_id: i64,
    pub category_name: String,
    pub cost_price: f64,
    pub selling_price: Option<f64>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn profit(&self) -> Option<f64> {
        self.selling_price.map(|s| s - self.cost_price)
    }
}

/// Only products with a selling price take part in margin statistics.
pub struct PricedProduct<'a>(pub &'a Product, pub f64);

impl Priced for PricedProduct<'_> {
    fn selling_price(&self) -> f64 {
        self.1
    }
    fn profit(&self) -> f64 {
        self.1 - self.0.cost_price
    }
}
