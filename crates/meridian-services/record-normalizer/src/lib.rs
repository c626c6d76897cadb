//! Record normalization service.
//!
//! Canonicalizes provider-specific raw billing/usage payloads into a
//! uniform [`CostRecord`] shape: required-field validation, currency
//! conversion to a single reporting currency, and within-batch
//! deduplication by composite key. Persistence is the caller's concern;
//! normalization has no side effects beyond the returned batch.

pub mod error;
pub mod models;
pub mod normalize;

pub use error::{NormalizerErrorExt, Result};
pub use models::{CostRecord, CurrencyTable, Provider, RawRecordBatch, RecordKey};
pub use normalize::{NormalizedBatch, Normalizer, RecordExtractor, RejectedRecord};
