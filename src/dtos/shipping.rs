use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};

use crate::calc::decimal;
use crate::calc::shipment_status::{DeliveryStatus, ShippingStatus};
use super::common::{EntityRef, EntitySummary};

#[derive(Debug, Deserialize)]
pub struct ShippingItemRequest {
    pub product: EntityRef,
    pub quantity: i32,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub unit_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateShippingRequest {
    pub name: String,
    pub arrival_date: NaiveDate,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub tracking_number: String,
    #[serde(default)]
    pub status: ShippingStatus,
    pub items: Vec<ShippingItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateShippingRequest {
    pub name: Option<String>,
    pub arrival_date: Option<NaiveDate>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub status: Option<ShippingStatus>,
    pub items: Option<Vec<ShippingItemRequest>>,
}

#[derive(Debug, Serialize)]
pub struct ShippingItemResponse {
    pub id: i64,
    pub product: EntitySummary,
    pub quantity: i32,
    #[serde(serialize_with = "decimal::serialize")]
    pub unit_price: f64,
    #[serde(serialize_with = "decimal::serialize")]
    pub line_total: f64,
}

impl From<crate::models::shipping::ShippingItem> for ShippingItemResponse {
    fn from(item: crate::models::shipping::ShippingItem) -> Self {
        Self {
            id: item.id,
            product: EntitySummary { id: item.product_id, name: item.product_name },
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.quantity as f64 * item.unit_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShippingResponse {
    pub id: i64,
    pub name: String,
    pub arrival_date: NaiveDate,
    pub carrier: String,
    pub tracking_number: String,
    /// What is stored; `delivery.status` is what should be shown.
    pub status: ShippingStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivery: DeliveryStatus,
    pub items: Vec<ShippingItemResponse>,
    #[serde(serialize_with = "decimal::serialize")]
    pub items_total: f64,
    pub created_at: DateTime<Utc>,
}
