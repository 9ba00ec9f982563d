use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

/// One mutex per key, created on first use and dropped once no caller holds
/// or waits on it. Holders of different keys never contend.
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `key`. The map shard is released
    /// before `f` runs.
    pub fn with_lock<R>(&self, key: &K, f: impl FnOnce() -> R) -> R {
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = mutex.lock();
            f()
        };
        // Clones are only taken under the shard lock, so a count of two (the
        // table and this call) means nobody else holds or waits on it.
        self.locks.remove_if(key, |_, entry| {
            Arc::ptr_eq(entry, &mutex) && Arc::strong_count(entry) == 2
        });
        result
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
