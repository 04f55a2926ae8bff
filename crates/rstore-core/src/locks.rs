use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::error::{StorageError, StorageResult};

/// One reader/writer lock per user.
///
/// Every path under a user shares one ancestor chain root, so serializing
/// writers per user keeps the content store and the ledger in step without
/// blocking other users. Entries nobody holds are evicted on the next
/// lookup, so the table only tracks users with operations in flight.
#[derive(Debug, Default)]
pub(crate) struct UserLocks {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl UserLocks {
    pub(crate) fn for_user(&self, user: &str) -> StorageResult<Arc<RwLock<()>>> {
        let mut locks = self.table()?;
        // Clones are only handed out under the table mutex, so a count of
        // one means no caller holds or is about to take this lock.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Ok(Arc::clone(locks.entry(user.to_string()).or_default()))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table().map(|locks| locks.len()).unwrap_or_default()
    }

    fn table(&self) -> StorageResult<MutexGuard<'_, HashMap<String, Arc<RwLock<()>>>>> {
        self.locks
            .lock()
            .map_err(|e| StorageError::Internal(format!("lock table poisoned: {e}")))
    }
}

pub(crate) fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Internal(format!("user lock poisoned: {e}"))
}
