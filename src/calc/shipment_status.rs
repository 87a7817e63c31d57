// src/calc/shipment_status.rs
//! Delivery countdown for shipments.
//!
//! The stored status only knows `pending`, `processing` and `delivered`. Whether a shipment is
//! overdue is derived from its arrival date and a reference instant supplied by the caller, so
//! the same request always renders every shipment against the same `now`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Status as persisted in `shippings.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShippingStatus {
    #[default]
    Pending,
    Processing,
    Delivered,
}

impl ShippingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingStatus::Pending => "pending",
            ShippingStatus::Processing => "processing",
            ShippingStatus::Delivered => "delivered",
        }
    }
}

impl fmt::Display for ShippingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ShippingStatus::Pending),
            "processing" => Ok(ShippingStatus::Processing),
            "delivered" => Ok(ShippingStatus::Delivered),
            other => Err(format!("unknown shipping status '{other}'")),
        }
    }
}

/// Status shown to the user. `Overdue` never reaches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    Pending,
    Processing,
    Delivered,
    Overdue,
}

impl From<ShippingStatus> for DisplayStatus {
    fn from(status: ShippingStatus) -> Self {
        match status {
            ShippingStatus::Pending => DisplayStatus::Pending,
            ShippingStatus::Processing => DisplayStatus::Processing,
            ShippingStatus::Delivered => DisplayStatus::Delivered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryStatus {
    pub status: DisplayStatus,
    pub days_info: String,
    pub is_overdue: bool,
    pub overdue_days: i64,
    pub days_remaining: i64,
    pub countdown_text: String,
}

/// Whole days from `now` until midnight UTC of `arrival_date`, rounded up.
pub fn days_until(arrival_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let arrival = arrival_date.and_time(NaiveTime::MIN).and_utc();
    let millis = (arrival - now).num_milliseconds();
    ceil_div(millis, MILLIS_PER_DAY)
}

fn ceil_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    if a % b != 0 && (a > 0) == (b > 0) {
        q + 1
    } else {
        q
    }
}

fn days(n: i64) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{n} days")
    }
}

pub fn delivery_status(
    arrival_date: NaiveDate,
    current: ShippingStatus,
    now: DateTime<Utc>,
) -> DeliveryStatus {
    let diff = days_until(arrival_date, now);
    let magnitude = diff.abs();

    if current == ShippingStatus::Delivered {
        let (days_info, countdown_text) = match diff {
            d if d > 0 => (format!("{} early", days(magnitude)), format!("{} early", days(magnitude))),
            0 => ("Delivered on time".to_string(), "Delivered on time".to_string()),
            _ => (format!("{} late", days(magnitude)), format!("{} late", days(magnitude))),
        };
        return DeliveryStatus {
            status: DisplayStatus::Delivered,
            days_info,
            is_overdue: diff < 0,
            overdue_days: if diff < 0 { magnitude } else { 0 },
            days_remaining: diff.max(0),
            countdown_text,
        };
    }

    if diff < 0 {
        let text = format!("{} overdue", days(magnitude));
        DeliveryStatus {
            status: DisplayStatus::Overdue,
            days_info: text.clone(),
            is_overdue: true,
            overdue_days: magnitude,
            days_remaining: 0,
            countdown_text: text,
        }
    } else if diff == 0 {
        DeliveryStatus {
            status: current.into(),
            days_info: "Due today".to_string(),
            is_overdue: false,
            overdue_days: 0,
            days_remaining: 0,
            countdown_text: "Due today".to_string(),
        }
    } else {
        DeliveryStatus {
            status: current.into(),
            days_info: format!("{} remaining", days(diff)),
            is_overdue: false,
            overdue_days: 0,
            days_remaining: diff,
            countdown_text: format!("{} left", days(diff)),
        }
    }
}
