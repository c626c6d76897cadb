use std::collections::HashMap;

use crate::error::Result;
use crate::models::Provider;

use super::extract::{
    decimal_field, opt_str, parse_iso_datetime, usage_field, ExtractedRecord, RecordExtractor,
};

/// Extractor for AWS Cost Explorer group results.
///
/// Shape: `{account_id, start_date, cost_amount, cost_currency,
/// usage_quantity, dimensions: {service, region, resource_id}, tags?}`.
pub struct AwsExtractor;

impl RecordExtractor for AwsExtractor {
    fn provider(&self) -> Provider {
        Provider::Aws
    }

    fn extract(&self, raw: &serde_json::Value) -> Result<ExtractedRecord> {
        let dimensions = raw.get("dimensions").cloned().unwrap_or_default();

        let timestamp = match opt_str(raw, "start_date") {
            Some(s) => Some(parse_iso_datetime(&s)?),
            None => None,
        };

        let mut tags = HashMap::new();
        if let Some(obj) = raw.get("tags").and_then(|t| t.as_object()) {
            for (k, v) in obj {
                if let Some(s) = v.as_str() {
                    tags.insert(k.clone(), s.to_string());
                }
            }
        }

        Ok(ExtractedRecord {
            account_id: opt_str(raw, "account_id"),
            resource_id: opt_str(&dimensions, "resource_id"),
            service: opt_str(&dimensions, "service"),
            region: opt_str(&dimensions, "region"),
            timestamp,
            amount: decimal_field(raw, "cost_amount")?,
            currency: opt_str(raw, "cost_currency").unwrap_or_else(|| "USD".to_string()),
            usage_quantity: usage_field(raw, "usage_quantity"),
            tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_extract_full_record() {
        let raw = json!({
            "account_id": "123456789",
            "start_date": "2024-03-05T10:00:00Z",
            "cost_amount": "12.34",
            "cost_currency": "USD",
            "usage_quantity": "4.0",
            "dimensions": {
                "service": "EC2",
                "region": "us-east-1",
                "resource_id": "i-0abc",
            },
            "tags": {"team": "ml"},
        });

        let rec = AwsExtractor.extract(&raw).unwrap();
        assert_eq!(rec.account_id.as_deref(), Some("123456789"));
        assert_eq!(rec.resource_id.as_deref(), Some("i-0abc"));
        assert_eq!(rec.service.as_deref(), Some("EC2"));
        assert_eq!(rec.amount, dec!(12.34));
        assert_eq!(rec.usage_quantity, 4.0);
        assert_eq!(rec.tags.get("team").map(String::as_str), Some("ml"));
    }

    #[test]
    fn test_extract_missing_amount_fails() {
        let raw = json!({
            "start_date": "2024-03-05T10:00:00Z",
            "dimensions": {"resource_id": "i-0abc"},
        });
        assert!(AwsExtractor.extract(&raw).is_err());
    }

    #[test]
    fn test_extract_without_optional_fields() {
        let raw = json!({
            "start_date": "2024-03-05T10:00:00Z",
            "cost_amount": 1.5,
            "dimensions": {"resource_id": "i-0abc"},
        });
        let rec = AwsExtractor.extract(&raw).unwrap();
        assert_eq!(rec.service, None);
        assert_eq!(rec.currency, "USD");
        assert_eq!(rec.usage_quantity, 0.0);
    }
}
