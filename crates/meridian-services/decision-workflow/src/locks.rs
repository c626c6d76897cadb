use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::{MeridianError, Result};

/// Per-resource exclusive execution locks.
///
/// At most one in-flight action per resource: the lock is held from the
/// Approved-to-Executing transition until the action reaches a terminal
/// state. Acquisition is bounded; on timeout the caller's transition
/// fails with `LockTimeout` and the recommendation stays Approved.
#[derive(Debug, Default)]
pub struct ResourceLockManager {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ResourceLockManager {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the exclusive lock for a resource, waiting at most `timeout`.
    pub async fn acquire(
        &self,
        resource_id: &str,
        timeout: Duration,
    ) -> Result<OwnedMutexGuard<()>> {
        let lock = self
            .locks
            .entry(resource_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => {
                debug!(resource_id, "execution lock acquired");
                Ok(guard)
            }
            Err(_) => Err(MeridianError::lock_timeout(resource_id)),
        }
    }
}
