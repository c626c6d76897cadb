use resource_inventory::ResourceState;
use rust_decimal::Decimal;

use crate::config::IdleRuleConfig;
use crate::models::{ActionType, EvidenceRef, RecommendationDraft};
use crate::rules::{RecommendationRule, RuleContext};
use crate::Result;

/// Flags resources whose utilization has stayed under a threshold for a
/// sustained run of samples and proposes stopping them.
pub struct IdleResourceRule {
    config: IdleRuleConfig,
}

impl IdleResourceRule {
    pub fn new(config: IdleRuleConfig) -> Self {
        Self { config }
    }
}

impl RecommendationRule for IdleResourceRule {
    fn name(&self) -> &'static str {
        "idle-resource"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<RecommendationDraft>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let entity = ctx.entity;
        if entity.state == ResourceState::Stopped {
            return Ok(None);
        }
        if !entity.sustained_below(self.config.idle_threshold_pct, self.config.sustained_periods)
        {
            return Ok(None);
        }

        // Stopping an idle resource reclaims its entire run-rate
        let savings = entity.monthly_cost;
        if savings <= Decimal::ZERO {
            return Ok(None);
        }

        let evidence = entity
            .utilization
            .iter()
            .rev()
            .take(self.config.sustained_periods)
            .map(|sample| EvidenceRef::Utilization {
                resource_id: entity.resource_id.clone(),
                observed_at: sample.observed_at,
            })
            .collect();

        Ok(Some(RecommendationDraft {
            resource_id: entity.resource_id.clone(),
            action_type: ActionType::Stop,
            estimated_monthly_savings: savings,
            confidence: 0.9,
            evidence,
            description: format!(
                "utilization at or under {}% for {} consecutive samples",
                self.config.idle_threshold_pct, self.config.sustained_periods
            ),
        }))
    }
}
