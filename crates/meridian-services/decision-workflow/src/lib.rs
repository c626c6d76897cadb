//! Approval workflow and action executor.
//!
//! Drives each recommendation through the explicit state machine
//! (Proposed through Completed/Failed/RolledBack) with exhaustive
//! transition validation, an exclusive per-resource execution lock,
//! bounded retries with exponential backoff against the provider
//! automation boundary, and write-ahead audit of every transition.

pub mod config;
pub mod locks;
pub mod models;
pub mod provider;
pub mod service;

pub use config::WorkflowConfig;
pub use locks::ResourceLockManager;
pub use models::{ApprovalDecision, Decision};
pub use provider::{ActionCommand, ActionRequest, CloudAutomation, ProviderReceipt, ProviderResourceState};
pub use service::WorkflowService;

pub use meridian_error::{MeridianError, Result};
pub use recommendation_engine::RecommendationStatus;
