//! Cache Eviction Policies.
//!
//! Implements the candidate policies replayed against an inference trace.
//!
//! # Policies
//!
//! - `NoCache`: Baseline, every access misses.
//! - `Lru`: Least Recently Used.
//! - `Slru`: Segmented LRU (probationary + protected segments).
//!
//! The set is closed: [`EvictionPolicy`] is a sum type over the three
//! variants, built from a [`PolicyKind`] at configuration time.

/// Baseline policy that never caches.
pub mod no_cache;

/// Least Recently Used eviction policy.
pub mod lru;

/// Slab-backed MRU-to-LRU key list shared by the LRU-family policies.
pub mod recency;

/// Segmented LRU eviction policy.
pub mod slru;

use serde::{Deserialize, Serialize};

pub use lru::LruCache;
pub use no_cache::NoCache;
pub use slru::{Segment, SegmentSplit, SlruCache};

use crate::common::{ConfigError, InvalidKeyError, Outcome};
use crate::config::PolicyKind;

/// Counters a policy keeps over one run.
///
/// `hits` and `misses` only count valid accesses; rejected keys appear in
/// neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCounters {
    /// Accesses that found the key resident.
    pub hits: u64,
    /// Accesses that did not find the key resident.
    pub misses: u64,
    /// Entries removed from the cache to make room.
    pub evictions: u64,
    /// SLRU: entries moved from probationary to protected.
    pub promotions: u64,
    /// SLRU: entries pushed back from protected to probationary.
    pub demotions: u64,
    /// SLRU: hits served from the probationary segment.
    pub probationary_hits: u64,
    /// SLRU: hits served from the protected segment.
    pub protected_hits: u64,
}

impl PolicyCounters {
    #[inline]
    pub(crate) const fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::Miss => self.misses += 1,
        }
    }
}

/// Interface shared by every eviction policy.
///
/// Defines the access operation and the bookkeeping observable from outside.
pub trait CachePolicy: Send {
    /// Looks `key` up, updates recency/segment state, and reports the outcome.
    ///
    /// On a miss the key is admitted, evicting as needed so that
    /// `occupancy() <= capacity()` holds again before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidKeyError`] for an empty key, leaving state and
    /// counters untouched.
    fn access(&mut self, key: &str) -> Result<Outcome, InvalidKeyError>;

    /// Returns `true` if `key` is resident, without touching recency.
    fn contains(&self, key: &str) -> bool;

    /// Number of resident entries.
    fn occupancy(&self) -> usize;

    /// Maximum number of resident entries.
    fn capacity(&self) -> usize;

    /// Counters accumulated since construction.
    fn counters(&self) -> PolicyCounters;
}

/// One of the three evaluated eviction policies.
#[derive(Debug)]
pub enum EvictionPolicy {
    /// Baseline without caching.
    NoCache(NoCache),
    /// Least Recently Used.
    Lru(LruCache),
    /// Segmented LRU.
    Slru(SlruCache),
}

impl EvictionPolicy {
    /// Builds an empty policy of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] for a zero capacity and
    /// [`ConfigError::InvalidSegmentSplit`] for an unusable SLRU split.
    pub fn new(kind: &PolicyKind, capacity: usize) -> Result<Self, ConfigError> {
        Ok(match *kind {
            PolicyKind::NoCache => Self::NoCache(NoCache::new(capacity)?),
            PolicyKind::Lru => Self::Lru(LruCache::new(capacity)?),
            PolicyKind::Slru { protected_ratio } => {
                Self::Slru(SlruCache::new(capacity, protected_ratio)?)
            }
        })
    }

    fn inner(&self) -> &dyn CachePolicy {
        match self {
            Self::NoCache(p) => p,
            Self::Lru(p) => p,
            Self::Slru(p) => p,
        }
    }
}

impl CachePolicy for EvictionPolicy {
    fn access(&mut self, key: &str) -> Result<Outcome, InvalidKeyError> {
        match self {
            Self::NoCache(p) => p.access(key),
            Self::Lru(p) => p.access(key),
            Self::Slru(p) => p.access(key),
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.inner().contains(key)
    }

    fn occupancy(&self) -> usize {
        self.inner().occupancy()
    }

    fn capacity(&self) -> usize {
        self.inner().capacity()
    }

    fn counters(&self) -> PolicyCounters {
        self.inner().counters()
    }
}

#[inline]
pub(crate) fn check_key(key: &str) -> Result<(), InvalidKeyError> {
    if key.is_empty() {
        Err(InvalidKeyError { sequence_index: 0 })
    } else {
        Ok(())
    }
}
