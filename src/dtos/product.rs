use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::calc::{decimal, margin};
use super::common::{EntityRef, EntitySummary};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub category: EntityRef,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub cost_price: f64,
    #[serde(default, deserialize_with = "decimal::deserialize_option")]
    pub selling_price: Option<f64>,
    #[serde(default)]
    pub stock: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<EntityRef>,
    #[serde(default, deserialize_with = "decimal::deserialize_option")]
    pub cost_price: Option<f64>,
    /// `null` removes the listed price.
    #[serde(default, deserialize_with = "decimal::deserialize_nullable")]
    pub selling_price: Option<Option<f64>>,
    pub stock: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub category: EntitySummary,
    #[serde(serialize_with = "decimal::serialize")]
    pub cost_price: f64,
    #[serde(serialize_with = "decimal::serialize_option")]
    pub selling_price: Option<f64>,
    #[serde(serialize_with = "decimal::serialize_option")]
    pub profit: Option<f64>,
    #[serde(serialize_with = "decimal::serialize_option")]
    pub margin: Option<f64>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::product::Product> for ProductResponse {
    fn from(product: crate::models::product::Product) -> Self {
        let profit = product.profit();
        let margin = product
            .selling_price
            .zip(profit)
            .map(|(selling, profit)| margin::margin(selling, profit));
        Self {
            id: product.id,
            name: product.name,
            sku: product.sku,
            category: EntitySummary { id: product.category_id, name: product.category_name },
            cost_price: product.cost_price,
            selling_price: product.selling_price,
            profit,
            margin,
            stock: product.stock,
            created_at: product.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_can_clear_selling_price() {
        let req: UpdateProductRequest = serde_json::from_str(r#"{"selling_price": null}"#).unwrap();
        assert_eq!(req.selling_price, Some(None));
        let req: UpdateProductRequest = serde_json::from_str(r#"{"name": "Sencha"}"#).unwrap();
        assert_eq!(req.selling_price, None);
    }
}
