//! Least Recently Used (LRU) Eviction Policy.
//!
//! This policy evicts the entry that has not been accessed for the longest
//! time. A hash index maps each resident key to its slot in a
//! [`RecencyList`]; an access moves the slot to the MRU end and the tail is
//! the eviction victim. Every access stamps a fresh recency position, so two
//! entries are never equally stale and insertion order decides between keys
//! that were never re-accessed (FIFO among them).
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `access()`: O(1) amortized (one hash lookup plus list relinking)
//!   - `keys_by_recency()`: O(n)
//! - **Space Complexity:** O(C) where C is the capacity
//! - **Best Case:** Strong temporal locality, e.g. repeated prompts in a session
//! - **Worst Case:** Cyclic scans over more distinct prompts than the capacity (thrashing)

use rustc_hash::FxHashMap;
use tracing::trace;

use super::recency::RecencyList;
use super::{CachePolicy, PolicyCounters, check_key};
use crate::common::{ConfigError, InvalidKeyError, Outcome};

/// LRU policy state.
#[derive(Debug)]
pub struct LruCache {
    capacity: usize,
    /// Resident key to its slot in `order`.
    index: FxHashMap<String, usize>,
    /// Head is MRU, tail is LRU.
    order: RecencyList,
    counters: PolicyCounters,
}

impl LruCache {
    /// Creates an empty LRU cache.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of resident entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity(capacity));
        }
        let mut index = FxHashMap::default();
        index.reserve(capacity + 1);
        Ok(Self {
            capacity,
            index,
            order: RecencyList::with_capacity(capacity + 1),
            counters: PolicyCounters::default(),
        })
    }

    /// Resident keys from most to least recently used.
    pub fn keys_by_recency(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter()
    }

    fn evict_overflow(&mut self) {
        while self.order.len() > self.capacity {
            let Some(victim) = self.order.pop_back() else {
                break;
            };
            let _slot = self.index.remove(&victim);
            self.counters.evictions += 1;
            trace!(key = %victim, "lru evict");
        }
    }
}

impl CachePolicy for LruCache {
    /// Hit moves the key to MRU; miss inserts at MRU, then evicts from the tail.
    fn access(&mut self, key: &str) -> Result<Outcome, InvalidKeyError> {
        check_key(key)?;
        let outcome = if let Some(&slot) = self.index.get(key) {
            self.order.move_to_front(slot);
            Outcome::Hit
        } else {
            let slot = self.order.push_front(key.to_owned());
            let _previous = self.index.insert(key.to_owned(), slot);
            self.evict_overflow();
            Outcome::Miss
        };
        self.counters.record(outcome);
        Ok(outcome)
    }

    fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    fn occupancy(&self) -> usize {
        self.order.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn counters(&self) -> PolicyCounters {
        self.counters
    }
}
