//! Per-login async locks serializing read-modify-write sequences.
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock table keyed by login. Entries are pruned once nobody holds or waits on them.
#[derive(Default)]
pub struct LockTable {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held for the duration of one account mutation
pub struct LoginLock<'a> {
    table: &'a LockTable,
    login: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `login`
    pub async fn lock(&self, login: &str) -> LoginLock<'_> {
        let mutex = self.locks.entry(login.to_string()).or_default().clone();
        let guard = mutex.lock_owned().await;
        LoginLock {
            table: self,
            login: login.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of logins currently tracked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for LoginLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // remove_if holds the shard lock, so no waiter can clone the mutex between check and removal
        self.table
            .locks
            .remove_if(&self.login, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
