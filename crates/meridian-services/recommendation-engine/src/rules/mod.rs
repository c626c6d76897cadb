pub mod budget_risk;
pub mod idle;
pub mod rightsize;

pub use budget_risk::BudgetRiskRule;
pub use idle::IdleResourceRule;
pub use rightsize::RightsizeRule;

use anomaly_detector::AnomalyEvent;
use cost_forecaster::ForecastSeries;
use resource_inventory::ResourceEntity;
use rust_decimal::Decimal;

use crate::models::RecommendationDraft;
use crate::Result;

/// Read-only evaluation snapshot for one resource.
///
/// Shared by reference across all rules; rules never mutate it, which is
/// what allows them to run concurrently.
pub struct RuleContext<'a> {
    pub entity: &'a ResourceEntity,
    /// Spend attributed to this resource over the recent aggregation window
    pub recent_cost: Decimal,
    /// Anomaly events touching this resource or its account, newest last
    pub anomalies: &'a [AnomalyEvent],
    /// Latest forecast for the dimension this resource rolls up into
    pub forecast: Option<&'a ForecastSeries>,
}

/// One optimization rule.
///
/// Rules are a closed set registered on the engine; each either drafts a
/// recommendation for the context's resource or stays silent.
pub trait RecommendationRule: Send + Sync {
    /// Stable rule name, used in logs and descriptions
    fn name(&self) -> &'static str;

    /// Evaluate the rule against one resource snapshot
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<RecommendationDraft>>;
}
