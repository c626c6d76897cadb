use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn env_parse<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleRuleConfig {
    pub enabled: bool,
    /// Utilization percentage at or under which a sample counts as idle
    pub idle_threshold_pct: f64,
    /// Consecutive idle samples required before the rule fires
    pub sustained_periods: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RightsizeRuleConfig {
    pub enabled: bool,
    /// Capacity must exceed peak usage by at least this factor
    pub headroom_factor: f64,
    /// Utilization samples considered when finding the peak
    pub peak_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetRiskRuleConfig {
    pub enabled: bool,
    /// Monthly budget in the reporting currency
    pub monthly_budget: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    pub idle: IdleRuleConfig,
    pub rightsize: RightsizeRuleConfig,
    pub budget_risk: BudgetRiskRuleConfig,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            idle: IdleRuleConfig {
                enabled: env_parse("RULE_IDLE_ENABLED", true),
                idle_threshold_pct: env_parse("RULE_IDLE_THRESHOLD_PCT", 5.0),
                sustained_periods: env_parse("RULE_IDLE_SUSTAINED_PERIODS", 10),
            },
            rightsize: RightsizeRuleConfig {
                enabled: env_parse("RULE_RIGHTSIZE_ENABLED", true),
                headroom_factor: env_parse("RULE_RIGHTSIZE_HEADROOM_FACTOR", 2.0),
                peak_window: env_parse("RULE_RIGHTSIZE_PEAK_WINDOW", 168),
            },
            budget_risk: BudgetRiskRuleConfig {
                enabled: env_parse("RULE_BUDGET_RISK_ENABLED", true),
                monthly_budget: env_parse("RULE_BUDGET_MONTHLY", Decimal::from(10_000)),
            },
        }
    }
}
