use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::calc::shipment_status::ShippingStatus;
use crate::error::AppError;

#[derive(Debug, FromRow)]
pub struct Shipping {
    pub id: i64,
    pub name: String,
    pub arrival_date: NaiveDate,
    pub carrier: String,
    pub tracking_number: String,
    pub status: String,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Shipping {
    pub fn status(&self) -> Result<ShippingStatus, AppError> {
        self.status.parse().map_err(AppError::internal)
    }
}

#[derive(Debug, FromRow)]
pub struct ShippingItem {
    pub id: i64,
    pub shipping_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_selling_price: Option<f64>,
    pub quantity: i32,
    pub unit_price: f64,
}
