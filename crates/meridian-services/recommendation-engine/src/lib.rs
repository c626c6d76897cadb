//! Recommendation engine.
//!
//! Evaluates an ordered, configurable set of optimization rules against
//! resource state, recent cost aggregates, and anomaly/forecast signals.
//! Rules are independent and read-only over a shared [`RuleContext`];
//! competing drafts for one resource are resolved by highest estimated
//! savings, then by the safer action. Emitted recommendations start in
//! `Proposed`.

pub mod config;
pub mod engine;
pub mod models;
pub mod rules;

pub use config::RulesConfig;
pub use engine::{OptimizationSummary, RecommendationEngine};
pub use models::{
    ActionType, EvidenceRef, Recommendation, RecommendationDraft, RecommendationStatus,
};
pub use rules::{RecommendationRule, RuleContext};

pub use meridian_error::{MeridianError, Result};
