// src/calc/decimal.rs
// Money values travel as strings ("12.50") but the dashboard also posts plain numbers.
use serde::{de, Deserialize, Deserializer, Serializer};
use std::fmt;

use super::format::decimal_string;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    Empty,
    Invalid(String),
}

impl fmt::Display for DecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecimalError::Empty => write!(f, "decimal value is empty"),
            DecimalError::Invalid(raw) => write!(f, "'{raw}' is not a valid decimal"),
        }
    }
}

impl std::error::Error for DecimalError {}

/// Parses a user supplied decimal. Unlike the form handling it replaces, garbage is an error
/// instead of a silent zero.
pub fn parse_decimal(raw: &str) -> Result<f64, DecimalError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DecimalError::Empty);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DecimalError::Invalid(trimmed.to_string())),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrFloat {
    String(String),
    Float(f64),
}

impl StringOrFloat {
    fn into_decimal<E: de::Error>(self) -> Result<f64, E> {
        match self {
            StringOrFloat::String(s) => parse_decimal(&s).map_err(de::Error::custom),
            StringOrFloat::Float(f) if f.is_finite() => Ok(f),
            StringOrFloat::Float(f) => Err(de::Error::custom(DecimalError::Invalid(f.to_string()))),
        }
    }
}

/// `#[serde(deserialize_with = "...")]` for a required decimal.
pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrFloat::deserialize(deserializer)?.into_decimal()
}

/// Optional decimal; `null` and a missing field both map to `None`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StringOrFloat>::deserialize(deserializer)? {
        Some(v) => v.into_decimal().map(Some),
        None => Ok(None),
    }
}

/// For partial updates where `null` clears the value: a missing field is `None`, `null` is
/// `Some(None)`. Pair with `#[serde(default)]`.
pub fn deserialize_nullable<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_option(deserializer).map(Some)
}

pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&decimal_string(*value))
}

pub fn serialize_option<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_str(&decimal_string(*v)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Deserialize, Serialize)]
    struct Priced {
        #[serde(deserialize_with = "deserialize", serialize_with = "serialize")]
        price: f64,
        #[serde(
            default,
            deserialize_with = "deserialize_option",
            serialize_with = "serialize_option"
        )]
        discount: Option<f64>,
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("12.5"), Ok(12.5));
        assert_eq!(parse_decimal("  7 "), Ok(7.0));
        assert_eq!(parse_decimal(""), Err(DecimalError::Empty));
        assert_eq!(parse_decimal("   "), Err(DecimalError::Empty));
        assert_eq!(parse_decimal("abc"), Err(DecimalError::Invalid("abc".into())));
        assert!(parse_decimal("NaN").is_err());
        assert!(parse_decimal("inf").is_err());
    }

    #[test]
    fn test_accepts_string_or_number() {
        let a: Priced = serde_json::from_str(r#"{"price": "10.25"}"#).unwrap();
        assert_eq!(a.price, 10.25);
        assert_eq!(a.discount, None);

        let b: Priced = serde_json::from_str(r#"{"price": 3, "discount": "1.5"}"#).unwrap();
        assert_eq!(b.price, 3.0);
        assert_eq!(b.discount, Some(1.5));

        let c: Priced = serde_json::from_str(r#"{"price": 3, "discount": null}"#).unwrap();
        assert_eq!(c.discount, None);
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_nullable")]
        price: Option<Option<f64>>,
    }

    #[test]
    fn test_nullable_tells_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.price, None);
        let cleared: Patch = serde_json::from_str(r#"{"price": null}"#).unwrap();
        assert_eq!(cleared.price, Some(None));
        let set: Patch = serde_json::from_str(r#"{"price": "4.20"}"#).unwrap();
        assert_eq!(set.price, Some(Some(4.2)));
        assert!(serde_json::from_str::<Patch>(r#"{"price": "x"}"#).is_err());
    }

    #[test]
    fn test_rejects_garbage_instead_of_zero() {
        let err = serde_json::from_str::<Priced>(r#"{"price": "abc"}"#);
        assert!(err.is_err());
        let err = serde_json::from_str::<Priced>(r#"{"price": ""}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_serializes_as_two_decimal_string() {
        let p = Priced { price: 2.5, discount: None };
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"price":"2.50","discount":null}"#);
    }
}
