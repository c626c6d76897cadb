pub mod cost_record;
pub mod currency;

pub use cost_record::{CostRecord, Provider, RawRecordBatch, RecordKey};
pub use currency::CurrencyTable;
