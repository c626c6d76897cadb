use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::error::{MeridianError, NormalizerErrorExt, Result};
use crate::models::Provider;

/// Provider-independent field set pulled out of one raw record.
///
/// Optional fields carry the normalizer's defaulting/rejection policy:
/// `resource_id` and `timestamp` are hard requirements, the rest default.
#[derive(Debug, Default)]
pub struct ExtractedRecord {
    pub account_id: Option<String>,
    pub resource_id: Option<String>,
    pub service: Option<String>,
    pub region: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub amount: Decimal,
    pub currency: String,
    pub usage_quantity: f64,
    pub tags: HashMap<String, String>,
}

/// Per-provider raw record field extraction
pub trait RecordExtractor: Send + Sync {
    fn provider(&self) -> Provider;
    fn extract(&self, raw: &serde_json::Value) -> Result<ExtractedRecord>;
}

pub fn parse_iso_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MeridianError::unparseable_field("timestamp", e.to_string()))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .map_err(|e| MeridianError::unparseable_field("amount", e.to_string()))
}

/// Optional string field from a JSON object
pub fn opt_str(value: &serde_json::Value, field: &str) -> Option<String> {
    value.get(field).and_then(|v| v.as_str()).map(String::from)
}

/// Decimal field that may arrive as a JSON string or number
pub fn decimal_field(value: &serde_json::Value, field: &str) -> Result<Decimal> {
    match value.get(field) {
        Some(serde_json::Value::String(s)) => parse_decimal(s),
        Some(serde_json::Value::Number(n)) => parse_decimal(&n.to_string()),
        _ => Err(MeridianError::missing_field(field)),
    }
}

/// f64 field that may arrive as a JSON string or number, defaulting to 0
pub fn usage_field(value: &serde_json::Value, field: &str) -> f64 {
    match value.get(field) {
        Some(serde_json::Value::String(s)) => s.parse().unwrap_or(0.0),
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_iso_datetime() {
        assert!(parse_iso_datetime("2024-01-01T00:00:00Z").is_ok());
        assert!(parse_iso_datetime("2024-01-01T00:00:00+02:00").is_ok());
        assert!(parse_iso_datetime("yesterday").is_err());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("123.45").unwrap(), dec!(123.45));
        assert!(parse_decimal("a lot").is_err());
    }

    #[test]
    fn test_decimal_field_string_or_number() {
        let v = json!({"a": "1.50", "b": 2.25});
        assert_eq!(decimal_field(&v, "a").unwrap(), dec!(1.50));
        assert_eq!(decimal_field(&v, "b").unwrap(), dec!(2.25));
        assert!(decimal_field(&v, "c").is_err());
    }

    #[test]
    fn test_usage_field_defaults_to_zero() {
        let v = json!({"q": "3.5", "r": 7});
        assert_eq!(usage_field(&v, "q"), 3.5);
        assert_eq!(usage_field(&v, "r"), 7.0);
        assert_eq!(usage_field(&v, "missing"), 0.0);
    }
}
