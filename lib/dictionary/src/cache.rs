use std::sync::{Mutex, MutexGuard, PoisonError};

/// A fixed-capacity, direct-mapped cache shared between threads.
///
/// Each slot holds at most one entry; a new entry simply replaces whatever lived in its slot.
/// The slots are spread over a small pool of mutexes: slot `i` is guarded by lock
/// `i % lock_count`, so threads working on different slots rarely contend.
#[derive(Debug)]
pub(crate) struct ShardedCache<K, V> {
    shards: Box<[Mutex<Box<[Option<(K, V)>]>>]>,
    capacity: usize,
}

impl<K, V: Clone> ShardedCache<K, V> {
    /// Creates a cache with `capacity` slots. A capacity of zero disables the cache.
    pub fn new(capacity: usize, lock_count: usize) -> Self {
        let lock_count = lock_count.clamp(1, capacity.max(1));
        let shards = (0..lock_count)
            .map(|shard| {
                let slots = (capacity + lock_count - 1 - shard) / lock_count;
                Mutex::new((0..slots).map(|_| None).collect())
            })
            .collect();
        Self { shards, capacity }
    }

    pub fn get(&self, hash: u64, matches: impl FnOnce(&K) -> bool) -> Option<V> {
        let (shard, slot) = self.locate(hash)?;
        match &self.lock(shard)[slot] {
            Some((key, value)) if matches(key) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn insert(&self, hash: u64, key: K, value: V) {
        if let Some((shard, slot)) = self.locate(hash) {
            self.lock(shard)[slot] = Some((key, value));
        }
    }

    fn locate(&self, hash: u64) -> Option<(usize, usize)> {
        if self.capacity == 0 {
            return None;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "The remainder is below the capacity"
        )]
        let slot = (hash % self.capacity as u64) as usize;
        Some((slot % self.shards.len(), slot / self.shards.len()))
    }

    fn lock(&self, shard: usize) -> MutexGuard<'_, Box<[Option<(K, V)>]>> {
        // Entries are replaced as a whole, so a panicking holder cannot leave a torn entry.
        self.shards[shard]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
