// src/calc/format.rs
// Display helpers shared by the dashboard summary and notification texts.

/// Two-decimal plain string, the wire form of every money value we emit.
///
/// ```text
/// decimal_string(12.5)  == "12.50"
/// decimal_string(-0.004) == "0.00"
/// ```
pub fn decimal_string(value: f64) -> String {
    if !value.is_finite() {
        return "0.00".to_string();
    }
    let rounded = round2(value);
    // avoid "-0.00"
    if rounded == 0.0 {
        return "0.00".to_string();
    }
    format!("{rounded:.2}")
}

/// Currency with thousands separators, sign in front of the symbol: `-$1,234.50`.
pub fn format_currency(value: f64, symbol: &str) -> String {
    let value = if value.is_finite() { round2(value) } else { 0.0 };
    let negative = value < 0.0;
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}{symbol}{grouped}.{frac_part}")
}

pub fn format_percent(value: f64, precision: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{value:.precision$}%")
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_string() {
        assert_eq!(decimal_string(0.0), "0.00");
        assert_eq!(decimal_string(12.5), "12.50");
        assert_eq!(decimal_string(32.499), "32.50");
        assert_eq!(decimal_string(-0.004), "0.00");
        assert_eq!(decimal_string(-3.1), "-3.10");
        assert_eq!(decimal_string(f64::NAN), "0.00");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0, "$"), "$0.00");
        assert_eq!(format_currency(5.0, "$"), "$5.00");
        assert_eq!(format_currency(999.99, "$"), "$999.99");
        assert_eq!(format_currency(1000.0, "$"), "$1,000.00");
        assert_eq!(format_currency(1234567.891, "€"), "€1,234,567.89");
        assert_eq!(format_currency(-5.0, "$"), "-$5.00");
        assert_eq!(format_currency(f64::INFINITY, "$"), "$0.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(12.3456, 1), "12.3%");
        assert_eq!(format_percent(20.0, 2), "20.00%");
        assert_eq!(format_percent(-4.0, 0), "-4%");
        assert_eq!(format_percent(f64::NAN, 1), "0.0%");
    }
}
