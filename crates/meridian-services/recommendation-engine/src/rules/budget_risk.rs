use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::config::BudgetRiskRuleConfig;
use crate::models::{ActionType, EvidenceRef, RecommendationDraft};
use crate::rules::{RecommendationRule, RuleContext};
use crate::Result;

/// Fires when the latest forecast's upper bound over its horizon exceeds
/// the configured budget, proposing workload scheduling to pull the
/// worst case back under it.
///
/// These drafts double as the outbound budget-risk alert objects.
pub struct BudgetRiskRule {
    config: BudgetRiskRuleConfig,
}

impl BudgetRiskRule {
    pub fn new(config: BudgetRiskRuleConfig) -> Self {
        Self { config }
    }
}

impl RecommendationRule for BudgetRiskRule {
    fn name(&self) -> &'static str {
        "budget-risk"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<RecommendationDraft>> {
        if !self.config.enabled {
            return Ok(None);
        }
        let Some(forecast) = ctx.forecast else {
            return Ok(None);
        };

        let worst_case =
            Decimal::from_f64(forecast.upper_bound_total()).unwrap_or(Decimal::ZERO);
        if worst_case <= self.config.monthly_budget {
            return Ok(None);
        }

        let overage = (worst_case - self.config.monthly_budget).round_dp(2);
        Ok(Some(RecommendationDraft {
            resource_id: ctx.entity.resource_id.clone(),
            action_type: ActionType::Schedule,
            estimated_monthly_savings: overage,
            confidence: 0.6,
            evidence: vec![EvidenceRef::Forecast {
                dimension: forecast.dimension.clone(),
                generated_at: forecast.generated_at,
            }],
            description: format!(
                "forecast upper bound {} exceeds budget {} for {}",
                worst_case.round_dp(2),
                self.config.monthly_budget,
                forecast.dimension
            ),
        }))
    }
}
