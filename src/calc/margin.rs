// src/calc/margin.rs
use serde::Serialize;

/// Margin buckets shown on the dashboard: `<15`, `15–20`, `20–25`, `≥25`.
pub const MARGIN_BOUNDARIES: [f64; 3] = [15.0, 20.0, 25.0];

/// Anything that has a selling price and a profit.
pub trait Priced {
    fn selling_price(&self) -> f64;
    fn profit(&self) -> f64;

    fn margin(&self) -> f64 {
        margin(self.selling_price(), self.profit())
    }
}

/// `profit / selling_price * 100`, zero when there is nothing sold.
pub fn margin(selling_price: f64, profit: f64) -> f64 {
    if selling_price > 0.0 {
        profit / selling_price * 100.0
    } else {
        0.0
    }
}

/// Mean margin of the collection, `0` when empty.
pub fn average_margin<T: Priced>(items: &[T]) -> f64 {
    mean(items.iter().map(Priced::margin))
}

/// Arithmetic mean, `0` for no values.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values.into_iter().fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub label: String,
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub count: usize,
}

/// Counts values per half-open `[low, high)` interval. `boundaries` must be ascending; the
/// first bucket is open below and the last one open above, so there are
/// `boundaries.len() + 1` buckets and every value is counted exactly once.
pub fn bucket_counts(values: impl IntoIterator<Item = f64>, boundaries: &[f64]) -> Vec<BucketCount> {
    let mut counts = vec![0usize; boundaries.len() + 1];
    for value in values {
        // NaN compares false everywhere and ends up in the first bucket
        let idx = boundaries.iter().take_while(|b| value >= **b).count();
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let low = if i == 0 { None } else { Some(boundaries[i - 1]) };
            let high = boundaries.get(i).copied();
            BucketCount { label: bucket_label(low, high), low, high, count }
        })
        .collect()
}

fn bucket_label(low: Option<f64>, high: Option<f64>) -> String {
    match (low, high) {
        (None, Some(h)) => format!("<{h}"),
        (Some(l), Some(h)) => format!("{l}-{h}"),
        (Some(l), None) => format!(">={l}"),
        (None, None) => "all".to_string(),
    }
}

pub fn margin_buckets<T: Priced>(items: &[T]) -> Vec<BucketCount> {
    bucket_counts(items.iter().map(Priced::margin), &MARGIN_BOUNDARIES)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        selling: f64,
        profit: f64,
    }

    impl Priced for Item {
        fn selling_price(&self) -> f64 {
            self.selling
        }
        fn profit(&self) -> f64 {
            self.profit
        }
    }

    fn item(selling: f64, profit: f64) -> Item {
        Item { selling, profit }
    }

    #[test]
    fn test_margin_formula() {
        assert_eq!(margin(100.0, 25.0), 25.0);
        assert_eq!(margin(50.0, -10.0), -20.0);
        assert_eq!(margin(0.0, 10.0), 0.0);
        assert_eq!(margin(0.0, -10.0), 0.0);
    }

    #[test]
    fn test_average_margin_empty_is_zero() {
        let items: Vec<Item> = Vec::new();
        assert_eq!(average_margin(&items), 0.0);
    }

    #[test]
    fn test_average_margin_is_mean() {
        let items = vec![item(100.0, 10.0), item(100.0, 30.0), item(0.0, 5.0)];
        // 10, 30, 0
        let avg = average_margin(&items);
        assert!((avg - 40.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::new()), 0.0);
        assert_eq!(mean(vec![12.5, 17.5]), 15.0);
    }

    #[test]
    fn test_buckets_are_half_open() {
        let buckets = bucket_counts(vec![14.99, 15.0, 19.99, 20.0, 24.0, 25.0, 80.0, -5.0], &MARGIN_BOUNDARIES);
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 2, 2, 2]);
        assert_eq!(buckets[0].label, "<15");
        assert_eq!(buckets[1].label, "15-20");
        assert_eq!(buckets[3].label, ">=25");
        assert_eq!(buckets[3].high, None);
    }

    #[test]
    fn test_buckets_partition_every_item_once() {
        let items: Vec<Item> = (0..57).map(|i| item(100.0, i as f64 * 0.7 - 3.0)).collect();
        let buckets = margin_buckets(&items);
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), items.len());
    }

    #[test]
    fn test_no_boundaries_single_bucket() {
        let buckets = bucket_counts(vec![1.0, 2.0], &[]);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].label, "all");
    }
}
