use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::calc::format::round2;
use crate::calc::{decimal, margin};
use crate::calc::pricing::{CostBreakdown, CostInputs, OtherCostType, ProductPricing};
use super::common::{amount, percent, EntitySummary};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreatePricingRequest {
    #[serde(default)]
    pub shipping: Option<i64>,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub shipping_cost: f64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub import_tax: f64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub other_costs: f64,
    #[serde(default)]
    pub other_cost_type: OtherCostType,
    #[serde(default, deserialize_with = "decimal::deserialize_option")]
    pub markup_percent: Option<f64>,
}

impl CreatePricingRequest {
    pub fn cost_inputs(&self) -> Result<CostInputs, AppError> {
        let other_costs = match self.other_cost_type {
            OtherCostType::Fixed => amount(self.other_costs, "other_costs")?,
            OtherCostType::Percentage => percent(self.other_costs, "other_costs")?,
        };
        Ok(CostInputs {
            shipping_cost: amount(self.shipping_cost, "shipping_cost")?,
            import_tax: amount(self.import_tax, "import_tax")?,
            other_costs,
            other_cost_type: self.other_cost_type,
        })
    }

    pub fn markup_or(&self, default_markup: f64) -> Result<f64, AppError> {
        percent(self.markup_percent.unwrap_or(default_markup), "markup_percent")
    }
}

#[derive(Debug, Serialize)]
pub struct PricingProductResponse {
    pub product: Option<EntitySummary>,
    pub product_name: String,
    pub quantity: i32,
    #[serde(serialize_with = "decimal::serialize")]
    pub unit_price: f64,
    #[serde(serialize_with = "decimal::serialize")]
    pub landed_unit_cost: f64,
    #[serde(serialize_with = "decimal::serialize")]
    pub selling_price: f64,
    #[serde(serialize_with = "decimal::serialize")]
    pub profit: f64,
    #[serde(serialize_with = "decimal::serialize")]
    pub margin: f64,
}

impl From<ProductPricing> for PricingProductResponse {
    fn from(p: ProductPricing) -> Self {
        Self {
            product: Some(EntitySummary { id: p.product_id, name: p.product_name.clone() }),
            product_name: p.product_name,
            quantity: p.quantity,
            unit_price: p.unit_price,
            landed_unit_cost: p.landed_unit_cost,
            selling_price: p.selling_price,
            profit: p.profit,
            margin: p.margin,
        }
    }
}

impl From<crate::models::pricing::PricingProduct> for PricingProductResponse {
    fn from(p: crate::models::pricing::PricingProduct) -> Self {
        Self {
            product: p.product_id.map(|id| EntitySummary { id, name: p.product_name.clone() }),
            product_name: p.product_name,
            quantity: p.quantity,
            unit_price: p.unit_price,
            landed_unit_cost: p.landed_unit_cost,
            selling_price: p.selling_price,
            profit: p.profit,
            margin: p.margin,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PricingResponse {
    /// `None` for previews that were not stored.
    pub id: Option<i64>,
    pub shipping: Option<EntitySummary>,
    pub products: Vec<PricingProductResponse>,
    #[serde(serialize_with = "decimal::serialize")]
    pub shipping_cost: f64,
    #[serde(serialize_with = "decimal::serialize")]
    pub import_tax: f64,
    #[serde(serialize_with = "decimal::serialize")]
    pub other_costs: f64,
    pub other_cost_type: OtherCostType,
    #[serde(serialize_with = "decimal::serialize")]
    pub markup_percent: f64,
    #[serde(serialize_with = "decimal::serialize")]
    pub base_cost: f64,
    #[serde(serialize_with = "decimal::serialize")]
    pub other_costs_amount: f64,
    #[serde(serialize_with = "decimal::serialize")]
    pub total_cost: f64,
    #[serde(serialize_with = "decimal::serialize")]
    pub average_margin: f64,
    pub created_at: Option<DateTime<Utc>>,
}

impl PricingResponse {
    pub fn from_breakdown(
        inputs: &CostInputs,
        breakdown: &CostBreakdown,
        markup_percent: f64,
        shipping: Option<EntitySummary>,
        products: Vec<ProductPricing>,
    ) -> Self {
        // averaged as stored, so a later GET reports the same figure
        let average_margin = margin::mean(products.iter().map(|p| round2(p.margin)));
        Self {
            id: None,
            shipping,
            products: products.into_iter().map(PricingProductResponse::from).collect(),
            shipping_cost: inputs.shipping_cost,
            import_tax: inputs.import_tax,
            other_costs: inputs.other_costs,
            other_cost_type: inputs.other_cost_type,
            markup_percent,
            base_cost: breakdown.base_cost,
            other_costs_amount: breakdown.other_costs_amount,
            total_cost: breakdown.total_cost,
            average_margin,
            created_at: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PricingSummary {
    pub id: i64,
    pub shipping: Option<EntitySummary>,
    pub other_cost_type: OtherCostType,
    #[serde(serialize_with = "decimal::serialize")]
    pub total_cost: f64,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}
