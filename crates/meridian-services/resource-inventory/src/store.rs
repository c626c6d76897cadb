use chrono::Utc;
use dashmap::DashMap;
use record_normalizer::CostRecord;
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{ResourceEntity, ResourceState, UtilizationSample};
use crate::{MeridianError, Result};

/// Hours in a billing month, used to project hourly spend to monthly run-rate
const HOURS_PER_MONTH: i64 = 730;

/// Concurrent keyed store of resource entities.
///
/// Owned by the pipeline and injected into the services that read it, so
/// parallel test instances never share state.
#[derive(Debug)]
pub struct InventoryStore {
    entities: DashMap<String, ResourceEntity>,
    /// Bound on retained utilization samples per resource
    max_samples: usize,
}

impl InventoryStore {
    pub fn new(max_samples: usize) -> Self {
        Self {
            entities: DashMap::new(),
            max_samples,
        }
    }

    /// Register the resource a cost record belongs to, updating its
    /// last-seen time and monthly run-rate.
    pub fn upsert_from_record(&self, record: &CostRecord, resource_type: &str) {
        let mut entry = self
            .entities
            .entry(record.resource_id.clone())
            .or_insert_with(|| {
                debug!(resource_id = %record.resource_id, "tracking new resource");
                ResourceEntity::new(record.resource_id.clone(), record.provider, resource_type)
            });
        entry.account_id = record.account_id.clone();
        entry.last_seen_at = record.timestamp();
        entry.monthly_cost = record.amount * Decimal::from(HOURS_PER_MONTH);
    }

    /// Record a utilization sample for a resource, keeping the window bounded
    pub fn record_utilization(&self, resource_id: &str, sample: UtilizationSample) -> Result<()> {
        let mut entry = self
            .entities
            .get_mut(resource_id)
            .ok_or_else(|| MeridianError::not_found("resource", resource_id))?;
        entry.utilization.push_back(sample);
        while entry.utilization.len() > self.max_samples {
            entry.utilization.pop_front();
        }
        Ok(())
    }

    /// Set a resource's provisioned capacity (from the monitoring collaborator)
    pub fn set_capacity(&self, resource_id: &str, capacity: f64) -> Result<()> {
        let mut entry = self
            .entities
            .get_mut(resource_id)
            .ok_or_else(|| MeridianError::not_found("resource", resource_id))?;
        entry.provisioned_capacity = capacity;
        Ok(())
    }

    /// Transition a resource's lifecycle state.
    ///
    /// Entities are never removed; executed actions land here as state
    /// transitions only.
    pub fn transition_state(&self, resource_id: &str, to: ResourceState) -> Result<()> {
        let mut entry = self
            .entities
            .get_mut(resource_id)
            .ok_or_else(|| MeridianError::not_found("resource", resource_id))?;
        if !entry.state.can_transition(to) {
            return Err(MeridianError::invalid_transition(
                entry.state.to_string(),
                to.to_string(),
            ));
        }
        debug!(resource_id, from = %entry.state, %to, "resource state transition");
        entry.state = to;
        entry.last_seen_at = Utc::now();
        Ok(())
    }

    /// Snapshot of one entity
    pub fn get(&self, resource_id: &str) -> Option<ResourceEntity> {
        self.entities.get(resource_id).map(|e| e.clone())
    }

    /// Snapshot of all tracked entities
    pub fn list(&self) -> Vec<ResourceEntity> {
        let mut all: Vec<ResourceEntity> =
            self.entities.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));
        all
    }

    /// Number of tracked entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
