//! Keyed mutual exclusion for per-machine critical sections.
//!
//! The presence transition is a read-modify-write over a machine row and its
//! open session; interleaving two of them for the same machine can open two
//! concurrent sessions. Locks are created lazily per key and shared by the
//! ingestion path and the staleness reconciler. Operations on different keys
//! never contend.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// A lazily-populated map of async mutexes, one per machine key.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
}

impl KeyedLocks {
    /// Creates a new, empty `KeyedLocks`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `key`, creating it on first use.
    ///
    /// The returned guard is owned, so it can be held across `.await` points
    /// for the duration of the critical section.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.write().await;
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
