pub mod aws;
pub mod azure;
pub mod extract;
pub mod gcp;

pub use extract::{parse_decimal, parse_iso_datetime, ExtractedRecord, RecordExtractor};

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{MeridianError, NormalizerErrorExt, Result};
use crate::models::{CostRecord, CurrencyTable, Provider, RawRecordBatch, RecordKey};
use aws::AwsExtractor;
use azure::AzureExtractor;
use gcp::GcpExtractor;

/// A raw record the normalizer refused, with the reason.
///
/// Rejects are returned to the caller rather than silently dropped so
/// ingestion can log and alert on them.
#[derive(Debug)]
pub struct RejectedRecord {
    pub index: usize,
    pub error: MeridianError,
}

/// Output of normalizing one raw batch.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub records: Vec<CostRecord>,
    pub rejects: Vec<RejectedRecord>,
}

/// Canonicalizes raw provider billing payloads into [`CostRecord`]s.
///
/// Extraction is delegated to per-provider extractors registered at
/// construction; validation, currency conversion, and deduplication are
/// provider-independent.
pub struct Normalizer {
    extractors: HashMap<Provider, Box<dyn RecordExtractor>>,
    currency_table: CurrencyTable,
}

impl Normalizer {
    /// Create a normalizer with the built-in provider extractors
    pub fn new(currency_table: CurrencyTable) -> Self {
        let mut normalizer = Self {
            extractors: HashMap::new(),
            currency_table,
        };
        normalizer.register_extractor(Box::new(AwsExtractor));
        normalizer.register_extractor(Box::new(AzureExtractor));
        normalizer.register_extractor(Box::new(GcpExtractor));
        normalizer
    }

    /// Register (or replace) the extractor for a provider
    pub fn register_extractor(&mut self, extractor: Box<dyn RecordExtractor>) {
        self.extractors.insert(extractor.provider(), extractor);
    }

    /// Normalize one raw batch.
    ///
    /// Per-record failures are collected as rejects and never abort the
    /// batch. Output is deduplicated by composite key with last-seen-wins
    /// semantics, and its order is deterministic for identical input.
    pub fn normalize_batch(&self, batch: &RawRecordBatch) -> Result<NormalizedBatch> {
        let extractor = self.extractors.get(&batch.provider).ok_or_else(|| {
            MeridianError::invalid_provider(format!(
                "no extractor registered for provider: {}",
                batch.provider
            ))
        })?;

        let mut out = NormalizedBatch::default();
        // First-seen position, so last-seen-wins replacement keeps a
        // deterministic output order.
        let mut positions: HashMap<RecordKey, usize> = HashMap::new();

        for (index, raw) in batch.records.iter().enumerate() {
            match self.normalize_one(extractor.as_ref(), batch.provider, raw) {
                Ok(record) => {
                    let key = record.key();
                    match positions.get(&key) {
                        Some(&pos) => {
                            debug!(key = %record.resource_id, "duplicate record key, keeping last seen");
                            out.records[pos] = record;
                        }
                        None => {
                            positions.insert(key, out.records.len());
                            out.records.push(record);
                        }
                    }
                }
                Err(error) => {
                    warn!(index, %error, "skipping raw record");
                    out.rejects.push(RejectedRecord { index, error });
                }
            }
        }

        Ok(out)
    }

    fn normalize_one(
        &self,
        extractor: &dyn RecordExtractor,
        provider: Provider,
        raw: &serde_json::Value,
    ) -> Result<CostRecord> {
        let extracted = extractor.extract(raw)?;

        let resource_id = extracted
            .resource_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| MeridianError::missing_field("resource_id"))?;
        let timestamp = extracted
            .timestamp
            .ok_or_else(|| MeridianError::missing_field("timestamp"))?;

        let amount = self
            .currency_table
            .convert(extracted.amount, &extracted.currency)?;

        Ok(CostRecord {
            provider,
            account_id: extracted
                .account_id
                .unwrap_or_else(|| "Unknown".to_string()),
            resource_id,
            service: extracted.service.unwrap_or_else(|| "Unknown".to_string()),
            region: extracted.region.unwrap_or_else(|| "Unknown".to_string()),
            period: meridian_types::Period::from_timestamp(timestamp),
            amount,
            currency: self.currency_table.reporting_currency.clone(),
            usage_quantity: extracted.usage_quantity,
            tags: extracted.tags,
        })
    }
}
