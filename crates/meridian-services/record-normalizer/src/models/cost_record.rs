use chrono::{DateTime, Utc};
use meridian_types::Period;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::NormalizerErrorExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "aws")]
    Aws,
    #[serde(rename = "azure")]
    Azure,
    #[serde(rename = "gcp")]
    Gcp,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Aws => write!(f, "aws"),
            Provider::Azure => write!(f, "azure"),
            Provider::Gcp => write!(f, "gcp"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = crate::error::MeridianError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws" => Ok(Provider::Aws),
            "azure" => Ok(Provider::Azure),
            "gcp" => Ok(Provider::Gcp),
            _ => Err(crate::error::MeridianError::invalid_provider(s)),
        }
    }
}

/// A batch of raw, provider-shaped billing records as fetched by an
/// external connector. The payloads are opaque until extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecordBatch {
    pub provider: Provider,
    pub records: Vec<serde_json::Value>,
}

impl RawRecordBatch {
    pub fn new(provider: Provider, records: Vec<serde_json::Value>) -> Self {
        Self { provider, records }
    }
}

/// Composite identity of a cost record.
///
/// Two records with the same key describe the same billed hour of the
/// same resource; within a batch the last-seen value wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub provider: Provider,
    pub account_id: String,
    pub resource_id: String,
    pub period: Period,
    pub service: String,
}

/// A canonical, immutable cost record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub provider: Provider,
    pub account_id: String,
    pub resource_id: String,
    pub service: String,
    pub region: String,
    /// Hour-granularity usage period
    pub period: Period,
    /// Amount in the reporting currency
    pub amount: Decimal,
    /// Reporting currency code the amount was converted into
    pub currency: String,
    pub usage_quantity: f64,
    pub tags: HashMap<String, String>,
}

impl CostRecord {
    /// The composite deduplication key for this record
    pub fn key(&self) -> RecordKey {
        RecordKey {
            provider: self.provider,
            account_id: self.account_id.clone(),
            resource_id: self.resource_id.clone(),
            period: self.period,
            service: self.service.clone(),
        }
    }

    /// Timestamp of the record's usage period
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.period.start()
    }
}
