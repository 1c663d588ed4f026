//! Deadline-bounded access to the entity store.
//!
//! Every store call made by the core goes through [`StoreHandle::run`], which
//! races it against the configured timeout. A call that loses the race is
//! dropped: open sqlx transactions roll back on drop, and in-memory writes
//! never yield mid-update, so a timed-out write leaves no partial state.

use std::future::Future;
use std::time::Duration;

use crate::error::CoreError;
use crate::store::{EntityStore, StoreResult};

/// Default upper bound for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// A borrowed store plus the deadline applied to each call.
#[derive(Clone, Copy)]
pub struct StoreHandle<'a> {
    store: &'a dyn EntityStore,
    timeout: Duration,
}

impl<'a> StoreHandle<'a> {
    pub fn new(store: &'a dyn EntityStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Run one store operation under the deadline.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, CoreError>
    where
        F: FnOnce(&'a dyn EntityStore) -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.timeout, op(self.store)).await {
            Ok(result) => result.map_err(CoreError::from),
            Err(_) => Err(CoreError::StorageUnavailable(format!(
                "storage call did not complete within {:?}",
                self.timeout
            ))),
        }
    }
}
