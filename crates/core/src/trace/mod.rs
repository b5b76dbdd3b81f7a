//! Request traces.
//!
//! A [`Trace`] is the validated, immutable sequence of recorded requests that
//! every policy run replays. It provides:
//! 1. **Events:** [`TraceEvent`] with sequence index, canonical key, and cost.
//! 2. **Validation:** Strictly increasing indexes and positive finite costs.
//! 3. **Loading:** JSON trace files in the formats the datasets use ([`loader`]).
//! 4. **Synthesis:** Repeated-prompt streams for controlled experiments ([`synth`]).
//!
//! One trace is shared by reference across all runs (and threads), which is
//! what makes the policy comparison fair.

/// JSON trace loading.
pub mod loader;

/// Synthetic trace generation.
pub mod synth;

use serde::{Deserialize, Serialize};

use crate::common::TraceError;

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Position in the canonical replay order.
    pub sequence_index: u64,
    /// Canonical cache key.
    pub key: String,
    /// Inference cost avoided by a hit (approximate tokens by default).
    pub cost: f64,
}

impl TraceEvent {
    /// Creates an event.
    pub fn new(sequence_index: u64, key: impl Into<String>, cost: f64) -> Self {
        Self {
            sequence_index,
            key: key.into(),
            cost,
        }
    }
}

/// Validated, ordered request trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trace {
    events: Vec<TraceEvent>,
}

impl Trace {
    /// Validates `events` and wraps them.
    ///
    /// Keys are not checked here: an empty key is a per-event condition the
    /// replayer reports and skips without aborting the run.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::NonIncreasingIndex`] if an index does not exceed
    /// its predecessor, or [`TraceError::InvalidCost`] for a cost that is not
    /// positive and finite.
    pub fn new(events: Vec<TraceEvent>) -> Result<Self, TraceError> {
        let mut previous: Option<u64> = None;
        for event in &events {
            if let Some(previous) = previous {
                if event.sequence_index <= previous {
                    return Err(TraceError::NonIncreasingIndex {
                        previous,
                        current: event.sequence_index,
                    });
                }
            }
            if !(event.cost.is_finite() && event.cost > 0.0) {
                return Err(TraceError::InvalidCost {
                    sequence_index: event.sequence_index,
                    cost: event.cost,
                });
            }
            previous = Some(event.sequence_index);
        }
        Ok(Self { events })
    }

    /// Builds a trace of unit-cost events numbered from zero, keys used verbatim.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let events = keys
            .into_iter()
            .enumerate()
            .map(|(i, key)| TraceEvent::new(i as u64, key, 1.0))
            .collect();
        Self { events }
    }

    /// Events in replay order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Iterates events in replay order.
    pub fn iter(&self) -> std::slice::Iter<'_, TraceEvent> {
        self.events.iter()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` for a trace without events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of distinct keys.
    pub fn distinct_keys(&self) -> usize {
        let mut keys: Vec<&str> = self.events.iter().map(|e| e.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a TraceEvent;
    type IntoIter = std::slice::Iter<'a, TraceEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
