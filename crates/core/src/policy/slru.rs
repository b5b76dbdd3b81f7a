//! Segmented LRU (SLRU) Eviction Policy.
//!
//! Capacity is split into two LRU segments. New keys enter the
//! **probationary** segment; a second access promotes a key into the
//! **protected** segment. When protected overflows, its LRU entry is demoted
//! back to the MRU end of probationary rather than dropped, so a key leaves
//! the cache only from the probationary tail.
//!
//! A burst of one-time prompts therefore churns probationary only and cannot
//! displace keys that have proven reuse, which plain LRU does not guarantee.
//!
//! # Performance
//!
//! - **Time Complexity:** `access()` O(1) amortized, including promotion and
//!   demotion
//! - **Space Complexity:** O(C) where C is the total capacity

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::recency::RecencyList;
use super::{CachePolicy, PolicyCounters, check_key};
use crate::common::{ConfigError, InvalidKeyError, Outcome};

/// Segment an SLRU entry resides in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    /// Keys seen once since admission.
    Probationary,
    /// Keys that were hit at least once.
    Protected,
}

/// Sizes of the two SLRU segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSplit {
    /// Capacity of the protected segment.
    pub protected: usize,
    /// Capacity of the probationary segment.
    pub probationary: usize,
}

impl SegmentSplit {
    /// Splits `capacity` giving `protected_ratio` of it to the protected segment.
    ///
    /// The protected share is rounded to the nearest entry and clamped so that
    /// both segments hold at least one entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] for a zero capacity, and
    /// [`ConfigError::InvalidSegmentSplit`] when `protected_ratio` is not in
    /// the open interval (0, 1) or `capacity` is below two.
    pub fn new(capacity: usize, protected_ratio: f64) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity(capacity));
        }
        if !(protected_ratio > 0.0 && protected_ratio < 1.0) || capacity < 2 {
            return Err(ConfigError::InvalidSegmentSplit {
                ratio: protected_ratio,
                capacity,
            });
        }
        let protected =
            ((capacity as f64 * protected_ratio).round() as usize).clamp(1, capacity - 1);
        Ok(Self {
            protected,
            probationary: capacity - protected,
        })
    }

    /// Total capacity across both segments.
    pub const fn total(&self) -> usize {
        self.protected + self.probationary
    }
}

/// SLRU policy state.
#[derive(Debug)]
pub struct SlruCache {
    split: SegmentSplit,
    /// Resident key to its segment and slot within that segment's list.
    index: FxHashMap<String, (Segment, usize)>,
    probationary: RecencyList,
    protected: RecencyList,
    counters: PolicyCounters,
}

impl SlruCache {
    /// Creates an empty SLRU cache.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Total resident entries across both segments.
    /// * `protected_ratio` - Fraction of `capacity` for the protected segment.
    ///
    /// # Errors
    ///
    /// See [`SegmentSplit::new`].
    pub fn new(capacity: usize, protected_ratio: f64) -> Result<Self, ConfigError> {
        let split = SegmentSplit::new(capacity, protected_ratio)?;
        let mut index = FxHashMap::default();
        index.reserve(capacity);
        Ok(Self {
            split,
            index,
            probationary: RecencyList::with_capacity(split.probationary),
            protected: RecencyList::with_capacity(split.protected + 1),
            counters: PolicyCounters::default(),
        })
    }

    /// Segment sizes in effect.
    pub const fn split(&self) -> SegmentSplit {
        self.split
    }

    /// Segment holding `key`, if resident.
    pub fn segment_of(&self, key: &str) -> Option<Segment> {
        self.index.get(key).map(|&(segment, _)| segment)
    }

    /// Protected keys from most to least recently used.
    pub fn protected_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.protected.iter()
    }

    /// Probationary keys from most to least recently used.
    pub fn probationary_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.probationary.iter()
    }

    /// Drops probationary LRU entries until one more key fits.
    fn make_probationary_room(&mut self) {
        while self.probationary.len() >= self.split.probationary {
            let Some(victim) = self.probationary.pop_back() else {
                break;
            };
            let _entry = self.index.remove(&victim);
            self.counters.evictions += 1;
            trace!(key = %victim, "slru evict from probationary");
        }
    }

    /// Admits a key seen for the first time.
    fn admit(&mut self, key: &str) {
        self.make_probationary_room();
        let slot = self.probationary.push_front(key.to_owned());
        let _previous = self
            .index
            .insert(key.to_owned(), (Segment::Probationary, slot));
    }

    /// Moves a probationary hit into protected, demoting protected's LRU on overflow.
    fn promote(&mut self, slot: usize) {
        let key = self.probationary.remove(slot);
        let new_slot = self.protected.push_front(key);
        if let Some(entry) = self.index.get_mut(self.protected.key(new_slot)) {
            *entry = (Segment::Protected, new_slot);
        }
        self.counters.promotions += 1;

        if self.protected.len() > self.split.protected {
            if let Some(demoted) = self.protected.pop_back() {
                self.counters.demotions += 1;
                trace!(key = %demoted, "slru demote to probationary");
                self.make_probationary_room();
                let slot = self.probationary.push_front(demoted);
                if let Some(entry) = self.index.get_mut(self.probationary.key(slot)) {
                    *entry = (Segment::Probationary, slot);
                }
            }
        }
    }
}

impl CachePolicy for SlruCache {
    fn access(&mut self, key: &str) -> Result<Outcome, InvalidKeyError> {
        check_key(key)?;
        let outcome = match self.index.get(key).copied() {
            None => {
                self.admit(key);
                Outcome::Miss
            }
            Some((Segment::Probationary, slot)) => {
                self.counters.probationary_hits += 1;
                self.promote(slot);
                Outcome::Hit
            }
            Some((Segment::Protected, slot)) => {
                self.counters.protected_hits += 1;
                self.protected.move_to_front(slot);
                Outcome::Hit
            }
        };
        self.counters.record(outcome);
        Ok(outcome)
    }

    fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    fn occupancy(&self) -> usize {
        self.probationary.len() + self.protected.len()
    }

    fn capacity(&self) -> usize {
        self.split.total()
    }

    fn counters(&self) -> PolicyCounters {
        self.counters
    }
}
