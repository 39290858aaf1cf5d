use std::sync::Arc;

use dashmap::DashMap;
use log::trace;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::db_types::TransactionId;

type LockMap = DashMap<TransactionId, Arc<Mutex<()>>>;

/// Serializes work on a single gateway transaction.
///
/// Calls for different transaction ids never contend. Calls for the same id queue up in arrival order. Entries are
/// removed from the map as soon as the last holder or waiter lets go, so the map only ever holds ids that are in use.
#[derive(Debug, Clone, Default)]
pub struct TransactionLocks {
    locks: Arc<LockMap>,
}

impl TransactionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no one else holds the lock for `id`, then takes it. The lock is released when the returned guard
    /// is dropped.
    pub async fn lock(&self, id: &TransactionId) -> TransactionGuard {
        let mutex = self.locks.entry(id.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;
        trace!("🔒️ Locked transaction {id}");
        TransactionGuard { id: id.clone(), guard: Some(guard), locks: Arc::clone(&self.locks) }
    }

    /// The number of transaction ids currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

pub struct TransactionGuard {
    id: TransactionId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left means no holder and no waiter.
        self.locks.remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
        trace!("🔒️ Released transaction {}", self.id);
    }
}
