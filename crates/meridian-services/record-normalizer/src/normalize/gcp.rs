use std::collections::HashMap;

use crate::error::Result;
use crate::models::Provider;

use super::extract::{
    decimal_field, opt_str, parse_iso_datetime, usage_field, ExtractedRecord, RecordExtractor,
};

/// Extractor for GCP billing export rows.
///
/// Shape: `{project_id, usage_date, total_cost, usage_amount,
/// dimensions: {service, region, resource_name}, labels?}`. GCP exports
/// carry no per-row currency; billing accounts report in USD.
pub struct GcpExtractor;

impl RecordExtractor for GcpExtractor {
    fn provider(&self) -> Provider {
        Provider::Gcp
    }

    fn extract(&self, raw: &serde_json::Value) -> Result<ExtractedRecord> {
        let dimensions = raw.get("dimensions").cloned().unwrap_or_default();

        let timestamp = match opt_str(raw, "usage_date") {
            Some(s) => Some(parse_iso_datetime(&s)?),
            None => None,
        };

        let mut tags = HashMap::new();
        if let Some(obj) = raw.get("labels").and_then(|t| t.as_object()) {
            for (k, v) in obj {
                if let Some(s) = v.as_str() {
                    tags.insert(k.clone(), s.to_string());
                }
            }
        }

        Ok(ExtractedRecord {
            account_id: opt_str(raw, "project_id"),
            resource_id: opt_str(&dimensions, "resource_name"),
            service: opt_str(&dimensions, "service"),
            region: opt_str(&dimensions, "region"),
            timestamp,
            amount: decimal_field(raw, "total_cost")?,
            currency: "USD".to_string(),
            usage_quantity: usage_field(raw, "usage_amount"),
            tags,
        })
    }
}
