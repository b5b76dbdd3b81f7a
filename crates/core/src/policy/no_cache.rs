//! No-Cache Baseline Policy.
//!
//! Every access is a miss and nothing is ever resident. Replaying a trace
//! through this policy gives the latency and cost of serving every request
//! from the backend, which is the reference the caching policies are
//! compared against.

use super::{CachePolicy, PolicyCounters, check_key};
use crate::common::{ConfigError, InvalidKeyError, Outcome};

/// Baseline policy state: only its nominal capacity and counters.
#[derive(Debug)]
pub struct NoCache {
    capacity: usize,
    counters: PolicyCounters,
}

impl NoCache {
    /// Creates the baseline policy.
    ///
    /// The capacity is never used for storage but is validated like every
    /// other policy's so that all runs share one budget.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity,
            counters: PolicyCounters::default(),
        })
    }
}

impl CachePolicy for NoCache {
    fn access(&mut self, key: &str) -> Result<Outcome, InvalidKeyError> {
        check_key(key)?;
        self.counters.record(Outcome::Miss);
        Ok(Outcome::Miss)
    }

    fn contains(&self, _key: &str) -> bool {
        false
    }

    fn occupancy(&self) -> usize {
        0
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn counters(&self) -> PolicyCounters {
        self.counters
    }
}
