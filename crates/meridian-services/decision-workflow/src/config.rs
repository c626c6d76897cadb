use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn env_parse<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Maximum age of supporting evidence before a submission bounces
    /// back to Proposed, in seconds
    pub evidence_max_age_secs: u64,
    /// Savings at or under this cap skip human approval (the Approved
    /// transition is still logged)
    pub auto_approve_cap: Decimal,
    /// Total provider call attempts before a recommendation is Failed
    pub max_attempts: u32,
    /// Backoff before retry attempt n is `backoff_base * 2^(n-1)`
    pub backoff_base_ms: u64,
    /// Bound on waiting for the per-resource execution lock
    pub lock_timeout_ms: u64,
    /// Bound on each individual provider call
    pub provider_call_timeout_ms: u64,
}

impl WorkflowConfig {
    pub fn evidence_max_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.evidence_max_age_secs as i64)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn provider_call_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_call_timeout_ms)
    }

    /// Backoff before the given 1-based retry attempt
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << exp))
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            evidence_max_age_secs: env_parse("WORKFLOW_EVIDENCE_MAX_AGE_SECS", 86_400),
            auto_approve_cap: env_parse("WORKFLOW_AUTO_APPROVE_CAP", Decimal::from(50)),
            max_attempts: env_parse("WORKFLOW_MAX_ATTEMPTS", 3),
            backoff_base_ms: env_parse("WORKFLOW_BACKOFF_BASE_MS", 500),
            lock_timeout_ms: env_parse("WORKFLOW_LOCK_TIMEOUT_MS", 5_000),
            provider_call_timeout_ms: env_parse("WORKFLOW_PROVIDER_TIMEOUT_MS", 30_000),
        }
    }
}
