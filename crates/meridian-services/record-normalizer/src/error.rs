//! Error handling for the record normalizer.
//!
//! Uses `meridian_error::MeridianError` as the unified error type with
//! domain-specific constructors for field extraction failures.

pub use meridian_error::{MeridianError, Result};

/// Extension trait for normalizer-specific error construction
pub trait NormalizerErrorExt {
    /// Creates an error for a record missing a required field
    fn missing_field(field: &str) -> MeridianError {
        MeridianError::malformed_record(format!("missing required field: {}", field))
    }

    /// Creates an error for an unparseable field value
    fn unparseable_field(field: &str, reason: impl Into<String>) -> MeridianError {
        MeridianError::malformed_record(format!(
            "unparseable field {}: {}",
            field,
            reason.into()
        ))
    }

    /// Creates an error for an unrecognized provider name
    fn invalid_provider(provider: impl Into<String>) -> MeridianError {
        MeridianError::invalid_input(
            "provider",
            format!("invalid provider: {}", provider.into()),
        )
    }
}

impl NormalizerErrorExt for MeridianError {}
