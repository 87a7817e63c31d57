// src/calc/metrics.rs
// Aggregates behind the dashboard cards and charts.
use serde::Serialize;

use super::shipment_status::DisplayStatus;

/// Selling price bands for the price distribution chart.
pub const PRICE_BOUNDARIES: [f64; 3] = [10.0, 50.0, 100.0];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category_id: i64,
    pub name: String,
    pub product_count: i64,
    pub share_percent: f64,
}

pub fn category_share(counts: &[(i64, String, i64)]) -> Vec<CategoryShare> {
    let total: i64 = counts.iter().map(|(_, _, c)| *c).sum();
    counts
        .iter()
        .map(|(id, name, count)| CategoryShare {
            category_id: *id,
            name: name.clone(),
            product_count: *count,
            share_percent: if total > 0 { *count as f64 / total as f64 * 100.0 } else { 0.0 },
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusTally {
    pub pending: usize,
    pub processing: usize,
    pub delivered: usize,
    pub overdue: usize,
}

pub fn status_tally(statuses: impl IntoIterator<Item = DisplayStatus>) -> StatusTally {
    statuses.into_iter().fold(StatusTally::default(), |mut t, s| {
        match s {
            DisplayStatus::Pending => t.pending += 1,
            DisplayStatus::Processing => t.processing += 1,
            DisplayStatus::Delivered => t.delivered += 1,
            DisplayStatus::Overdue => t.overdue += 1,
        }
        t
    })
}

/// Σ cost_price × stock
pub fn inventory_value(products: &[(f64, i32)]) -> f64 {
    products.iter().map(|(cost, stock)| cost * *stock as f64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::margin::bucket_counts;

    #[test]
    fn test_category_share() {
        let shares = category_share(&[(1, "Tea".into(), 3), (2, "Coffee".into(), 1), (3, "Empty".into(), 0)]);
        assert_eq!(shares[0].share_percent, 75.0);
        assert_eq!(shares[1].share_percent, 25.0);
        assert_eq!(shares[2].share_percent, 0.0);
    }

    #[test]
    fn test_category_share_no_products() {
        let shares = category_share(&[(1, "Tea".into(), 0)]);
        assert_eq!(shares[0].share_percent, 0.0);
        assert!(category_share(&[]).is_empty());
    }

    #[test]
    fn test_status_tally() {
        let t = status_tally(vec![
            DisplayStatus::Pending,
            DisplayStatus::Overdue,
            DisplayStatus::Overdue,
            DisplayStatus::Delivered,
        ]);
        assert_eq!(t, StatusTally { pending: 1, processing: 0, delivered: 1, overdue: 2 });
    }

    #[test]
    fn test_price_distribution() {
        let buckets = bucket_counts(vec![5.0, 10.0, 49.99, 50.0, 250.0], &PRICE_BOUNDARIES);
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 2, 1, 1]);
    }

    #[test]
    fn test_inventory_value() {
        assert_eq!(inventory_value(&[(2.5, 4), (10.0, 0), (1.0, 3)]), 13.0);
        assert_eq!(inventory_value(&[]), 0.0);
    }
}
