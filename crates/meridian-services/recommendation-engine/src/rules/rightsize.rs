use resource_inventory::ResourceState;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::config::RightsizeRuleConfig;
use crate::models::{ActionType, EvidenceRef, RecommendationDraft};
use crate::rules::{RecommendationRule, RuleContext};
use crate::Result;

/// Flags resources whose provisioned capacity far exceeds their peak
/// observed usage and proposes shrinking them to peak plus headroom.
pub struct RightsizeRule {
    config: RightsizeRuleConfig,
}

impl RightsizeRule {
    pub fn new(config: RightsizeRuleConfig) -> Self {
        Self { config }
    }
}

impl RecommendationRule for RightsizeRule {
    fn name(&self) -> &'static str {
        "rightsize"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<RecommendationDraft>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let entity = ctx.entity;
        if entity.state == ResourceState::Stopped || entity.provisioned_capacity <= 0.0 {
            return Ok(None);
        }
        let Some(peak) = entity.peak_utilization(self.config.peak_window) else {
            return Ok(None);
        };

        // Target capacity keeps the configured headroom over peak usage;
        // fire only when current capacity exceeds that target
        let target_fraction = (peak * self.config.headroom_factor / 100.0).min(1.0);
        if target_fraction >= 1.0 {
            return Ok(None);
        }

        let removable_fraction = 1.0 - target_fraction;
        let savings = entity.monthly_cost
            * Decimal::from_f64(removable_fraction).unwrap_or(Decimal::ZERO);
        if savings <= Decimal::ZERO {
            return Ok(None);
        }

        let evidence = entity
            .utilization
            .iter()
            .rev()
            .take(self.config.peak_window)
            .max_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal))
            .map(|sample| EvidenceRef::Utilization {
                resource_id: entity.resource_id.clone(),
                observed_at: sample.observed_at,
            })
            .into_iter()
            .collect();

        Ok(Some(RecommendationDraft {
            resource_id: entity.resource_id.clone(),
            action_type: ActionType::Rightsize,
            estimated_monthly_savings: savings.round_dp(2),
            confidence: 0.7,
            evidence,
            description: format!(
                "peak utilization {:.1}% leaves {:.0}% of capacity removable at {}x headroom",
                peak,
                removable_fraction * 100.0,
                self.config.headroom_factor
            ),
        }))
    }
}
