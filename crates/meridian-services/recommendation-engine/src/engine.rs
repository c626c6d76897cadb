use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::RulesConfig;
use crate::models::{Recommendation, RecommendationDraft};
use crate::rules::{BudgetRiskRule, IdleResourceRule, RecommendationRule, RightsizeRule, RuleContext};
use crate::Result;

/// Roll-up of one evaluation run, for reporting and alerting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub total_current_cost: Decimal,
    pub total_potential_savings: Decimal,
    /// Savings as a fraction of current cost, 0..=1
    pub savings_fraction: f64,
    pub recommendations_count: usize,
    pub high_confidence_count: usize,
}

/// Evaluates the registered rule set over resource snapshots and emits
/// ranked recommendations.
pub struct RecommendationEngine {
    rules: Vec<Box<dyn RecommendationRule>>,
}

impl RecommendationEngine {
    /// Engine with the built-in rules, honoring per-rule enable flags
    pub fn new(config: RulesConfig) -> Self {
        let rules: Vec<Box<dyn RecommendationRule>> = vec![
            Box::new(IdleResourceRule::new(config.idle)),
            Box::new(RightsizeRule::new(config.rightsize)),
            Box::new(BudgetRiskRule::new(config.budget_risk)),
        ];
        Self { rules }
    }

    /// Engine with an explicit rule set, for tests and extensions
    pub fn with_rules(rules: Vec<Box<dyn RecommendationRule>>) -> Self {
        Self { rules }
    }

    /// Evaluate every rule against every context.
    ///
    /// Rules are read-only over the contexts. When several rules draft
    /// actions for the same resource, the highest estimated savings wins;
    /// equal savings fall back to the safer action type.
    pub fn evaluate(&self, contexts: &[RuleContext<'_>]) -> Result<Vec<Recommendation>> {
        let mut per_resource: HashMap<String, RecommendationDraft> = HashMap::new();

        for ctx in contexts {
            for rule in &self.rules {
                let draft = match rule.evaluate(ctx) {
                    Ok(draft) => draft,
                    Err(error) => {
                        // One rule failing never poisons the run
                        debug!(rule = rule.name(), %error, "rule evaluation failed");
                        continue;
                    }
                };
                let Some(draft) = draft else { continue };
                debug!(
                    rule = rule.name(),
                    resource_id = %draft.resource_id,
                    savings = %draft.estimated_monthly_savings,
                    "rule fired"
                );

                match per_resource.entry(draft.resource_id.clone()) {
                    std::collections::hash_map::Entry::Vacant(slot) => {
                        slot.insert(draft);
                    }
                    std::collections::hash_map::Entry::Occupied(mut slot) => {
                        if Self::outranks(&draft, slot.get()) {
                            slot.insert(draft);
                        }
                    }
                }
            }
        }

        let mut recommendations: Vec<Recommendation> = per_resource
            .into_values()
            .map(Recommendation::from_draft)
            .collect();
        // Highest savings first for the consumer-facing ranking
        recommendations.sort_by(|a, b| {
            b.estimated_monthly_savings
                .cmp(&a.estimated_monthly_savings)
                .then(a.action_type.risk_rank().cmp(&b.action_type.risk_rank()))
                .then(a.resource_id.cmp(&b.resource_id))
        });

        info!(count = recommendations.len(), "evaluation run complete");
        Ok(recommendations)
    }

    /// Whether `a` beats `b` for the same resource
    fn outranks(a: &RecommendationDraft, b: &RecommendationDraft) -> bool {
        match a.estimated_monthly_savings.cmp(&b.estimated_monthly_savings) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => a.action_type.risk_rank() < b.action_type.risk_rank(),
        }
    }

    /// Summarize an evaluation run against the current spend it covers
    pub fn summarize(
        recommendations: &[Recommendation],
        total_current_cost: Decimal,
    ) -> OptimizationSummary {
        let total_potential_savings: Decimal = recommendations
            .iter()
            .map(|r| r.estimated_monthly_savings)
            .sum();
        let savings_fraction = if total_current_cost > Decimal::ZERO {
            use rust_decimal::prelude::ToPrimitive;
            (total_potential_savings / total_current_cost)
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };

        OptimizationSummary {
            total_current_cost,
            total_potential_savings,
            savings_fraction,
            recommendations_count: recommendations.len(),
            high_confidence_count: recommendations
                .iter()
                .filter(|r| r.confidence >= 0.8)
                .count(),
        }
    }
}
