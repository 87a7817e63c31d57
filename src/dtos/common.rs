use serde::{Deserialize, Serialize};

/// A reference to another record. The dashboard sends either the bare id or the object it
/// received from us, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(i64),
    Object {
        id: i64,
        #[serde(default)]
        name: Option<String>,
    },
}

impl EntityRef {
    pub fn id(&self) -> i64 {
        match self {
            EntityRef::Id(id) => *id,
            EntityRef::Object { id, .. } => *id,
        }
    }
}

/// The `{id, name}` shape we emit for references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    pub id: i64,
    pub name: String,
}

pub fn required_text(value: &str, field: &str) -> Result<String, crate::error::AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub fn non_negative(value: f64, field: &str) -> Result<f64, crate::error::AppError> {
    if value < 0.0 {
        return Err(crate::error::AppError::validation(format!("{field} cannot be negative")));
    }
    Ok(value)
}

/// Largest value a `NUMERIC(12, 2)` money column holds.
pub const MAX_AMOUNT: f64 = 9_999_999_999.99;
/// Largest value a `NUMERIC(8, 2)` percentage column holds.
pub const MAX_PERCENT: f64 = 999_999.99;

/// A money input that fits its column.
pub fn amount(value: f64, field: &str) -> Result<f64, crate::error::AppError> {
    bounded(value, field, MAX_AMOUNT)
}

pub fn percent(value: f64, field: &str) -> Result<f64, crate::error::AppError> {
    bounded(value, field, MAX_PERCENT)
}

fn bounded(value: f64, field: &str, max: f64) -> Result<f64, crate::error::AppError> {
    let value = non_negative(value, field)?;
    if value > max {
        return Err(crate::error::AppError::validation(format!(
            "{field} cannot exceed {}",
            crate::calc::format::decimal_string(max)
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ref_accepts_both_shapes() {
        let a: EntityRef = serde_json::from_str("4").unwrap();
        let b: EntityRef = serde_json::from_str(r#"{"id": 4, "name": "Tea"}"#).unwrap();
        let c: EntityRef = serde_json::from_str(r#"{"id": 4}"#).unwrap();
        assert_eq!(a.id(), 4);
        assert_eq!(b.id(), 4);
        assert_eq!(c.id(), 4);
        assert!(serde_json::from_str::<EntityRef>(r#"{"name": "Tea"}"#).is_err());
    }

    #[test]
    fn test_required_text_trims() {
        assert_eq!(required_text("  Tea ", "name").unwrap(), "Tea");
        assert!(required_text("   ", "name").is_err());
    }

    #[test]
    fn test_amount_and_percent_fit_their_columns() {
        assert_eq!(amount(MAX_AMOUNT, "shipping_cost").unwrap(), MAX_AMOUNT);
        let err = amount(99_999_999_999.0, "shipping_cost").unwrap_err();
        assert_eq!(err.to_string(), "shipping_cost cannot exceed 9999999999.99");
        assert!(amount(-1.0, "shipping_cost").is_err());
        assert_eq!(percent(250.0, "markup_percent").unwrap(), 250.0);
        assert!(percent(5_000_000.0, "markup_percent").is_err());
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(0.0, "price").unwrap(), 0.0);
        assert!(non_negative(-0.01, "price").is_err());
    }
}
