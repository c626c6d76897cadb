//! # Meridian Error Handling
//!
//! This crate provides the unified error type for the Meridian cost
//! decision engine. It uses `thiserror` for ergonomic error definitions
//! and supports conversion to `anyhow::Error` for application code.
//!
//! ## Features
//!
//! - **Comprehensive Error Variants**: covers ingestion, analytics,
//!   workflow, and execution failures
//! - **Error Categorization**: helper methods to classify errors
//!   (retriable, client errors, fatal-to-run)
//! - **Type Safety**: strong typing with thiserror-derived implementations
//!
//! ## Usage
//!
//! ```rust
//! use meridian_error::{MeridianError, Result};
//!
//! fn operation() -> Result<String> {
//!     Err(MeridianError::UnknownCurrency {
//!         currency: "XYZ".to_string(),
//!     })
//! }
//!
//! assert!(operation().unwrap_err().is_client_error());
//! ```

use thiserror::Error;

/// The main error type for the Meridian decision engine.
///
/// This enum covers all error categories that can occur across the
/// ingestion, analytics, recommendation, and workflow services.
#[derive(Error, Debug)]
pub enum MeridianError {
    /// A raw billing record is missing a required field or is unparseable
    #[error("malformed record: {reason}")]
    MalformedRecord { reason: String },

    /// No conversion rate exists for a record's currency
    #[error("unknown currency: {currency}")]
    UnknownCurrency { currency: String },

    /// A dimension lacks the minimum history required for forecasting
    #[error("insufficient history for {dimension}: need {required}, have {available}")]
    InsufficientHistory {
        dimension: String,
        required: usize,
        available: usize,
    },

    /// A recommendation's supporting evidence is missing or too old
    #[error("stale evidence for recommendation {recommendation_id}: {reason}")]
    EvidenceStale {
        recommendation_id: String,
        reason: String,
    },

    /// The per-resource execution lock could not be acquired in time
    #[error("lock timeout on resource {resource_id}")]
    LockTimeout { resource_id: String },

    /// A cloud provider automation call errored or timed out
    #[error("provider call failed for {action}: {reason}")]
    ProviderCallFailed { action: String, reason: String },

    /// The action type defines no compensating (inverse) operation
    #[error("action {action} is irreversible")]
    IrreversibleAction { action: String },

    /// A state transition not present in the workflow transition table
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Configuration-related errors (invalid config, missing fields, etc.)
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Audit ledger write failure; fatal to the whole pipeline run
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Resource not found errors
    #[error("{resource_type} not found: {resource_id}")]
    NotFound {
        resource_type: String,
        resource_id: String,
    },

    /// Invalid input validation errors
    #[error("invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// Internal errors (bugs, unexpected states, etc.)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Type alias for Results using MeridianError
pub type Result<T> = std::result::Result<T, MeridianError>;

impl From<serde_json::Error> for MeridianError {
    fn from(err: serde_json::Error) -> Self {
        MeridianError::Serialization(err.to_string())
    }
}

impl MeridianError {
    /// Determines if this error is retriable.
    ///
    /// Retriable errors are transient failures that may succeed on retry,
    /// such as lock contention or provider call failures. Ledger failures
    /// are never retriable: they threaten the write-ahead audit invariant.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            MeridianError::LockTimeout { .. } | MeridianError::ProviderCallFailed { .. }
        )
    }

    /// Determines if this error is a client error.
    ///
    /// Client errors indicate that the input was invalid and should not
    /// be retried without modification.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MeridianError::MalformedRecord { .. }
                | MeridianError::UnknownCurrency { .. }
                | MeridianError::InvalidInput { .. }
                | MeridianError::NotFound { .. }
                | MeridianError::Config(_)
                | MeridianError::Serialization(_)
        )
    }

    /// Determines if this error aborts an entire pipeline run.
    ///
    /// Per-record and per-dimension failures recover locally; only ledger
    /// failures are fatal to the run.
    #[must_use]
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, MeridianError::Ledger(_))
    }

    // ==========================================
    // Convenience constructors
    // ==========================================

    /// Creates a malformed record error
    #[must_use]
    pub fn malformed_record(reason: impl Into<String>) -> Self {
        MeridianError::MalformedRecord {
            reason: reason.into(),
        }
    }

    /// Creates an unknown currency error
    #[must_use]
    pub fn unknown_currency(currency: impl Into<String>) -> Self {
        MeridianError::UnknownCurrency {
            currency: currency.into(),
        }
    }

    /// Creates an insufficient history error
    #[must_use]
    pub fn insufficient_history(
        dimension: impl Into<String>,
        required: usize,
        available: usize,
    ) -> Self {
        MeridianError::InsufficientHistory {
            dimension: dimension.into(),
            required,
            available,
        }
    }

    /// Creates a stale evidence error
    #[must_use]
    pub fn evidence_stale(
        recommendation_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MeridianError::EvidenceStale {
            recommendation_id: recommendation_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a lock timeout error
    #[must_use]
    pub fn lock_timeout(resource_id: impl Into<String>) -> Self {
        MeridianError::LockTimeout {
            resource_id: resource_id.into(),
        }
    }

    /// Creates a provider call failure error
    #[must_use]
    pub fn provider_call_failed(action: impl Into<String>, reason: impl Into<String>) -> Self {
        MeridianError::ProviderCallFailed {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Creates an irreversible action error
    #[must_use]
    pub fn irreversible_action(action: impl Into<String>) -> Self {
        MeridianError::IrreversibleAction {
            action: action.into(),
        }
    }

    /// Creates an invalid transition error
    #[must_use]
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        MeridianError::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates a configuration error
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        MeridianError::Config(msg.into())
    }

    /// Creates a ledger error
    #[must_use]
    pub fn ledger(msg: impl Into<String>) -> Self {
        MeridianError::Ledger(msg.into())
    }

    /// Creates a not found error
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        MeridianError::NotFound {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Creates an invalid input error
    #[must_use]
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        MeridianError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an internal error
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        MeridianError::Internal(msg.into())
    }
}
