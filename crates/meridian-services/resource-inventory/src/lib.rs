//! Resource inventory service.
//!
//! Tracks every resource seen in the cost stream as a [`ResourceEntity`]:
//! its lifecycle state, provisioned capacity, and a bounded window of
//! utilization samples from the monitoring collaborator. Entities are
//! never deleted; obsolescence is a terminal state transition.

pub mod models;
pub mod store;

pub use models::{ResourceEntity, ResourceState, UtilizationSample};
pub use store::InventoryStore;

pub use meridian_error::{MeridianError, Result};
