//! Append-only audit ledger.
//!
//! Every workflow state transition is recorded here before its side
//! effects are considered complete (write-ahead discipline). Entries are
//! hash-chained per partition so tampering and gaps are detectable, and
//! sequence numbers are strictly increasing and gapless per partition.
//! A failed append is fatal to the pipeline run: nothing may proceed on
//! an unrecorded transition.

pub mod entry;
pub mod ledger;

pub use entry::AuditEntry;
pub use ledger::{AuditLedger, AuditSink};

pub use meridian_error::{MeridianError, Result};
