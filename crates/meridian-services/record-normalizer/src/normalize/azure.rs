use std::collections::HashMap;

use crate::error::Result;
use crate::models::Provider;

use super::extract::{
    decimal_field, opt_str, parse_iso_datetime, usage_field, ExtractedRecord, RecordExtractor,
};

/// Extractor for Azure Cost Management query rows.
///
/// Shape: `{subscription_id, usage_date, cost, currency, usage_quantity,
/// instance_id, service_name, resource_location, tags?}`.
pub struct AzureExtractor;

impl RecordExtractor for AzureExtractor {
    fn provider(&self) -> Provider {
        Provider::Azure
    }

    fn extract(&self, raw: &serde_json::Value) -> Result<ExtractedRecord> {
        let timestamp = match opt_str(raw, "usage_date") {
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
            account_id: opt_str(raw, "subscription_id"),
            resource_id: opt_str(raw, "instance_id"),
            service: opt_str(raw, "service_name"),
            region: opt_str(raw, "resource_location"),
            timestamp,
            amount: decimal_field(raw, "cost")?,
            currency: opt_str(raw, "currency").unwrap_or_else(|| "USD".to_string()),
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
            "subscription_id": "sub-42",
            "usage_date": "2024-03-05T10:00:00Z",
            "cost": "7.77",
            "currency": "EUR",
            "usage_quantity": 2.5,
            "instance_id": "/subscriptions/sub-42/vm/vm-9",
            "service_name": "Virtual Machines",
            "resource_location": "westeurope",
        });

        let rec = AzureExtractor.extract(&raw).unwrap();
        assert_eq!(rec.account_id.as_deref(), Some("sub-42"));
        assert_eq!(
            rec.resource_id.as_deref(),
            Some("/subscriptions/sub-42/vm/vm-9")
        );
        assert_eq!(rec.amount, dec!(7.77));
        assert_eq!(rec.currency, "EUR");
        assert_eq!(rec.usage_quantity, 2.5);
    }

    #[test]
    fn test_extract_missing_instance_id_is_none() {
        let raw = json!({
            "usage_date": "2024-03-05T10:00:00Z",
            "cost": "7.77",
        });
        let rec = AzureExtractor.extract(&raw).unwrap();
        // Rejection happens in the normalizer, not the extractor
        assert!(rec.resource_id.is_none());
    }
}
