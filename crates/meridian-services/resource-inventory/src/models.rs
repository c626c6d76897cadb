use chrono::{DateTime, Utc};
use record_normalizer::Provider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Lifecycle state of a tracked resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Active,
    Idle,
    Stopped,
}

impl ResourceState {
    /// Whether moving to `to` is a meaningful lifecycle transition.
    ///
    /// Stopped resources must come back through Active; they have no
    /// utilization to be idle on.
    pub fn can_transition(self, to: ResourceState) -> bool {
        match (self, to) {
            (a, b) if a == b => false,
            (ResourceState::Stopped, ResourceState::Idle) => false,
            _ => true,
        }
    }
}

impl std::fmt::Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceState::Active => write!(f, "active"),
            ResourceState::Idle => write!(f, "idle"),
            ResourceState::Stopped => write!(f, "stopped"),
        }
    }
}

/// One utilization observation from the monitoring collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSample {
    pub observed_at: DateTime<Utc>,
    /// Utilization percentage, 0..=100
    pub value: f64,
}

/// A tracked cloud resource.
///
/// Mutated only by ingestion (last_seen_at, samples) and by executed
/// actions (state); never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEntity {
    pub resource_id: String,
    pub provider: Provider,
    pub account_id: String,
    pub resource_type: String,
    pub state: ResourceState,
    /// Provisioned capacity in the resource's native unit (vCPUs, GB, ...)
    pub provisioned_capacity: f64,
    /// Current run-rate cost per month in the reporting currency
    pub monthly_cost: Decimal,
    pub last_seen_at: DateTime<Utc>,
    pub utilization: VecDeque<UtilizationSample>,
}

impl ResourceEntity {
    pub fn new(
        resource_id: impl Into<String>,
        provider: Provider,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            provider,
            account_id: String::new(),
            resource_type: resource_type.into(),
            state: ResourceState::Active,
            provisioned_capacity: 0.0,
            monthly_cost: Decimal::ZERO,
            last_seen_at: Utc::now(),
            utilization: VecDeque::new(),
        }
    }

    /// Peak utilization over the most recent `n` samples
    pub fn peak_utilization(&self, n: usize) -> Option<f64> {
        self.utilization
            .iter()
            .rev()
            .take(n)
            .map(|s| s.value)
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }

    /// Whether the most recent `n` samples all sit at or below `threshold`.
    ///
    /// Returns false when fewer than `n` samples exist: sustained idleness
    /// cannot be claimed from a short window.
    pub fn sustained_below(&self, threshold: f64, n: usize) -> bool {
        if n == 0 || self.utilization.len() < n {
            return false;
        }
        self.utilization
            .iter()
            .rev()
            .take(n)
            .all(|s| s.value <= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_with_samples(values: &[f64]) -> ResourceEntity {
        let mut entity = ResourceEntity::new("i-1", Provider::Aws, "vm");
        let base = Utc::now();
        for (i, &v) in values.iter().enumerate() {
            entity.utilization.push_back(UtilizationSample {
                observed_at: base + chrono::Duration::minutes(i as i64),
                value: v,
            });
        }
        entity
    }

    #[test]
    fn test_state_transitions() {
        assert!(ResourceState::Active.can_transition(ResourceState::Idle));
        assert!(ResourceState::Active.can_transition(ResourceState::Stopped));
        assert!(ResourceState::Idle.can_transition(ResourceState::Stopped));
        assert!(ResourceState::Stopped.can_transition(ResourceState::Active));
        assert!(!ResourceState::Stopped.can_transition(ResourceState::Idle));
        assert!(!ResourceState::Active.can_transition(ResourceState::Active));
    }

    #[test]
    fn test_peak_utilization() {
        let entity = entity_with_samples(&[10.0, 80.0, 30.0]);
        assert_eq!(entity.peak_utilization(3), Some(80.0));
        assert_eq!(entity.peak_utilization(1), Some(30.0));

        let empty = entity_with_samples(&[]);
        assert_eq!(empty.peak_utilization(5), None);
    }

    #[test]
    fn test_sustained_below() {
        let entity = entity_with_samples(&[90.0, 2.0, 3.0, 1.0]);
        assert!(entity.sustained_below(5.0, 3));
        assert!(!entity.sustained_below(5.0, 4));
        // Window larger than history
        assert!(!entity.sustained_below(5.0, 10));
        assert!(!entity.sustained_below(5.0, 0));
    }
}
