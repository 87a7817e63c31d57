use serde::Serialize;

use crate::calc::decimal;
use crate::calc::margin::BucketCount;
use crate::calc::metrics::{CategoryShare, StatusTally};

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub product_count: usize,
    pub category_count: usize,
    pub priced_product_count: usize,
    pub total_stock: i64,
    #[serde(serialize_with = "decimal::serialize")]
    pub inventory_value: f64,
    pub inventory_value_display: String,
    #[serde(serialize_with = "decimal::serialize")]
    pub average_margin: f64,
    pub average_margin_display: String,
    pub margin_buckets: Vec<BucketCount>,
    pub price_distribution: Vec<BucketCount>,
    pub category_share: Vec<CategoryShare>,
    pub shipments: StatusTally,
    pub unread_notifications: i64,
}
