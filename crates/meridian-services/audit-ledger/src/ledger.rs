use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

use crate::entry::AuditEntry;
use crate::{MeridianError, Result};

/// Receives every appended entry, e.g. the persistence/reporting
/// collaborator streaming the ledger out of process.
pub trait AuditSink: Send + Sync {
    fn on_entry(&self, entry: &AuditEntry);
}

/// In-memory append-only ledger with per-partition hash chains.
///
/// Appends within one partition are serialized; sequence numbers are
/// gapless from 1. Once sealed, every append fails, which callers must
/// treat as fatal to the run.
pub struct AuditLedger {
    partitions: DashMap<String, Vec<AuditEntry>>,
    sinks: Vec<Arc<dyn AuditSink>>,
    sealed: AtomicBool,
}

impl AuditLedger {
    pub fn new() -> Self {
        Self {
            partitions: DashMap::new(),
            sinks: Vec::new(),
            sealed: AtomicBool::new(false),
        }
    }

    /// Attach a sink that observes every appended entry
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Stop accepting writes. Used on shutdown; everything still trying
    /// to transition afterwards fails loudly instead of proceeding
    /// unaudited.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    /// Append a transition record.
    ///
    /// The entry is chained to its partition's previous entry and its
    /// sequence number is the next gapless value.
    pub fn append(
        &self,
        partition: &str,
        entity_type: &str,
        entity_id: &str,
        from_state: &str,
        to_state: &str,
        actor: &str,
    ) -> Result<AuditEntry> {
        if self.sealed.load(Ordering::SeqCst) {
            error!(partition, entity_id, "append on sealed ledger");
            return Err(MeridianError::ledger("ledger is sealed"));
        }

        // The entry guard serializes appends within the partition
        let mut log = self.partitions.entry(partition.to_string()).or_default();
        let sequence_no = log.len() as u64 + 1;
        let previous_hash = log.last().map(|e| e.hash.clone());

        let entry = AuditEntry::new(
            sequence_no,
            partition,
            entity_type,
            entity_id,
            from_state,
            to_state,
            actor,
            previous_hash,
        );
        log.push(entry.clone());
        drop(log);

        debug!(
            partition,
            sequence_no,
            entity_id,
            from_state,
            to_state,
            "audit entry appended"
        );
        for sink in &self.sinks {
            sink.on_entry(&entry);
        }
        Ok(entry)
    }

    /// All entries in a partition, in sequence order
    pub fn entries(&self, partition: &str) -> Vec<AuditEntry> {
        self.partitions
            .get(partition)
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// All entries for one entity in a partition, in sequence order
    pub fn entries_for_entity(&self, partition: &str, entity_id: &str) -> Vec<AuditEntry> {
        self.entries(partition)
            .into_iter()
            .filter(|e| e.entity_id == entity_id)
            .collect()
    }

    /// The most recent entry for one entity
    pub fn last_for_entity(&self, partition: &str, entity_id: &str) -> Option<AuditEntry> {
        self.entries_for_entity(partition, entity_id).pop()
    }

    /// Verify hash-chain integrity and sequence gaplessness of a partition
    pub fn verify_chain(&self, partition: &str) -> bool {
        let entries = self.entries(partition);
        let mut previous_hash: Option<String> = None;
        for (i, entry) in entries.iter().enumerate() {
            if entry.sequence_no != i as u64 + 1 {
                return false;
            }
            if entry.previous_hash != previous_hash {
                return false;
            }
            if !entry.verify_integrity() {
                return false;
            }
            previous_hash = Some(entry.hash.clone());
        }
        true
    }
}

impl Default for AuditLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn append_n(ledger: &AuditLedger, partition: &str, n: usize) {
        for i in 0..n {
            ledger
                .append(
                    partition,
                    "recommendation",
                    &format!("rec-{}", i),
                    "Proposed",
                    "PendingApproval",
                    "engine",
                )
                .unwrap();
        }
    }

    #[test]
    fn test_sequence_is_gapless_per_partition() {
        let ledger = AuditLedger::new();
        append_n(&ledger, "a", 5);
        append_n(&ledger, "b", 3);

        let a: Vec<u64> = ledger.entries("a").iter().map(|e| e.sequence_no).collect();
        let b: Vec<u64> = ledger.entries("b").iter().map(|e| e.sequence_no).collect();
        assert_eq!(a, vec![1, 2, 3, 4, 5]);
        assert_eq!(b, vec![1, 2, 3]);
    }

    #[test]
    fn test_chain_verifies() {
        let ledger = AuditLedger::new();
        append_n(&ledger, "a", 10);
        assert!(ledger.verify_chain("a"));
        // Empty partition chains trivially
        assert!(ledger.verify_chain("missing"));
    }

    #[test]
    fn test_entries_for_entity() {
        let ledger = AuditLedger::new();
        ledger
            .append("wf", "recommendation", "rec-1", "Proposed", "PendingApproval", "engine")
            .unwrap();
        ledger
            .append("wf", "recommendation", "rec-2", "Proposed", "PendingApproval", "engine")
            .unwrap();
        ledger
            .append("wf", "recommendation", "rec-1", "PendingApproval", "Approved", "alice")
            .unwrap();

        let rec1 = ledger.entries_for_entity("wf", "rec-1");
        assert_eq!(rec1.len(), 2);
        assert_eq!(
            ledger.last_for_entity("wf", "rec-1").unwrap().to_state,
            "Approved"
        );
        assert_eq!(ledger.last_for_entity("wf", "rec-3"), None);
    }

    #[test]
    fn test_sealed_ledger_refuses_appends() {
        let ledger = AuditLedger::new();
        append_n(&ledger, "a", 1);
        ledger.seal();

        let err = ledger
            .append("a", "recommendation", "rec-9", "Proposed", "PendingApproval", "engine")
            .unwrap_err();
        assert!(matches!(err, MeridianError::Ledger(_)));
        assert!(err.is_fatal_to_run());
        assert_eq!(ledger.entries("a").len(), 1);
    }

    #[test]
    fn test_sink_observes_every_entry() {
        struct Collector(Mutex<Vec<String>>);
        impl AuditSink for Collector {
            fn on_entry(&self, entry: &AuditEntry) {
                self.0.lock().unwrap().push(entry.entity_id.clone());
            }
        }

        let collector = Arc::new(Collector(Mutex::new(Vec::new())));
        let ledger = AuditLedger::new().with_sink(collector.clone());
        append_n(&ledger, "a", 3);

        let seen = collector.0.lock().unwrap();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_concurrent_appends_stay_gapless() {
        let ledger = Arc::new(AuditLedger::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let ledger = Arc::clone(&ledger);
            handles.push(std::thread::spawn(move || {
                for i in 0..25 {
                    ledger
                        .append(
                            "wf",
                            "recommendation",
                            &format!("rec-{}-{}", t, i),
                            "Proposed",
                            "PendingApproval",
                            "engine",
                        )
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let entries = ledger.entries("wf");
        assert_eq!(entries.len(), 200);
        assert!(ledger.verify_chain("wf"));
    }
}
