use meridian_error::MeridianError;
use serde::{Deserialize, Serialize};

/// An aggregation axis for cost/usage data.
///
/// Baselines, forecasts, and anomaly events are all keyed by dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Dimension {
    /// All spend under one billing account
    Account { account_id: String },
    /// One service within one billing account
    Service { account_id: String, service: String },
    /// A single resource
    Resource { resource_id: String },
}

impl Dimension {
    /// Dimension for a whole account
    pub fn account(account_id: impl Into<String>) -> Self {
        Dimension::Account {
            account_id: account_id.into(),
        }
    }

    /// Dimension for one service within an account
    pub fn service(account_id: impl Into<String>, service: impl Into<String>) -> Self {
        Dimension::Service {
            account_id: account_id.into(),
            service: service.into(),
        }
    }

    /// Dimension for a single resource
    pub fn resource(resource_id: impl Into<String>) -> Self {
        Dimension::Resource {
            resource_id: resource_id.into(),
        }
    }

    /// The resource id, when this dimension targets a single resource
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Dimension::Resource { resource_id } => Some(resource_id),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Account { account_id } => write!(f, "account/{}", account_id),
            Dimension::Service {
                account_id,
                service,
            } => write!(f, "service/{}/{}", account_id, service),
            Dimension::Resource { resource_id } => write!(f, "resource/{}", resource_id),
        }
    }
}

impl std::str::FromStr for Dimension {
    type Err = MeridianError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("account"), Some(id), None) if !id.is_empty() => Ok(Dimension::account(id)),
            (Some("service"), Some(id), Some(svc)) if !id.is_empty() && !svc.is_empty() => {
                Ok(Dimension::service(id, svc))
            }
            (Some("resource"), Some(id), None) if !id.is_empty() => Ok(Dimension::resource(id)),
            _ => Err(MeridianError::invalid_input(
                "dimension",
                format!("unrecognized dimension: {}", s),
            )),
        }
    }
}
