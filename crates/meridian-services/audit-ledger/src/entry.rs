//! Audit log entry structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Immutable record of one state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Strictly increasing, gapless position within the partition
    pub sequence_no: u64,
    /// Partition the sequence is scoped to
    pub partition: String,
    /// Kind of entity that transitioned (e.g. "recommendation")
    pub entity_type: String,
    pub entity_id: String,
    pub from_state: String,
    pub to_state: String,
    /// Who drove the transition: a user, a policy, or the engine itself
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    /// Hash of the previous entry in this partition's chain
    pub previous_hash: Option<String>,
    /// Hash of this entry's immutable fields
    pub hash: String,
}

impl AuditEntry {
    /// Build an entry and seal it with its chain hash
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence_no: u64,
        partition: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        from_state: impl Into<String>,
        to_state: impl Into<String>,
        actor: impl Into<String>,
        previous_hash: Option<String>,
    ) -> Self {
        let mut entry = Self {
            sequence_no,
            partition: partition.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            from_state: from_state.into(),
            to_state: to_state.into(),
            actor: actor.into(),
            timestamp: Utc::now(),
            previous_hash,
            hash: String::new(),
        };
        entry.hash = entry.calculate_hash();
        entry
    }

    /// Calculate the cryptographic hash of this entry
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sequence_no.to_be_bytes());
        hasher.update(self.partition.as_bytes());
        hasher.update(self.entity_type.as_bytes());
        hasher.update(self.entity_id.as_bytes());
        hasher.update(self.from_state.as_bytes());
        hasher.update(self.to_state.as_bytes());
        hasher.update(self.actor.as_bytes());
        hasher.update(self.timestamp.to_rfc3339().as_bytes());
        if let Some(ref prev) = self.previous_hash {
            hasher.update(prev.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Verify the integrity of this entry
    pub fn verify_integrity(&self) -> bool {
        self.hash == self.calculate_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(seq: u64, prev: Option<String>) -> AuditEntry {
        AuditEntry::new(
            seq,
            "workflow",
            "recommendation",
            "rec-1",
            "Proposed",
            "PendingApproval",
            "engine",
            prev,
        )
    }

    #[test]
    fn test_entry_hash_is_set() {
        let e = entry(1, None);
        assert!(!e.hash.is_empty());
        assert!(e.verify_integrity());
    }

    #[test]
    fn test_tamper_detection() {
        let mut e = entry(1, None);
        e.to_state = "Executing".to_string();
        assert!(!e.verify_integrity());
    }

    #[test]
    fn test_hash_covers_previous_link() {
        let first = entry(1, None);
        let chained = entry(2, Some(first.hash.clone()));
        let unchained = AuditEntry {
            previous_hash: None,
            ..chained.clone()
        };
        assert_ne!(chained.calculate_hash(), unchained.calculate_hash());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let e = entry(1, None);
        let json = serde_json::to_string(&e).unwrap();
        let back: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
        assert!(back.verify_integrity());
    }
}
