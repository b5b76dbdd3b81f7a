//! Trace replayer.
//!
//! Drives one eviction policy and one latency model through a trace, strictly
//! in trace order and one event at a time. The replayer owns the policy for
//! the duration of the run, so a policy that has seen a trace can never be
//! handed to a second run.

use std::iter::FusedIterator;
use std::slice;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::common::RunError;
use crate::latency::LatencyModel;
use crate::policy::{CachePolicy, EvictionPolicy, PolicyCounters};
use crate::stats::RequestRecord;
use crate::trace::{Trace, TraceEvent};

/// Cooperative cancellation flag, checked between trace events.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every run holding a clone of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`CancelToken::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything a completed replay produced.
#[derive(Debug)]
pub struct ReplayOutput {
    /// One record per valid event, in trace order.
    pub records: Vec<RequestRecord>,
    /// Events skipped because their key was invalid.
    pub skipped: u64,
    /// Policy counters at the end of the run.
    pub counters: PolicyCounters,
    /// Resident entries at the end of the run.
    pub final_occupancy: usize,
}

/// One policy run over one trace.
#[derive(Debug)]
pub struct Replayer<'t> {
    policy_name: Arc<str>,
    trace: &'t Trace,
    policy: EvictionPolicy,
    latency: LatencyModel,
    cancel: CancelToken,
}

impl<'t> Replayer<'t> {
    /// Prepares a run.
    ///
    /// # Arguments
    ///
    /// * `policy_name` - Label stamped on every record.
    /// * `trace` - Shared read-only trace.
    /// * `policy` - Freshly built, empty policy; consumed by the run.
    /// * `latency` - Freshly built latency model; consumed by the run.
    pub fn new(
        policy_name: &str,
        trace: &'t Trace,
        policy: EvictionPolicy,
        latency: LatencyModel,
    ) -> Self {
        Self {
            policy_name: Arc::from(policy_name),
            trace,
            policy,
            latency,
            cancel: CancelToken::new(),
        }
    }

    /// Uses `token` to allow aborting the run between events.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Lazy record stream, one item per valid event.
    pub fn records(self) -> Replay<'t> {
        Replay {
            events: self.trace.iter(),
            policy_name: self.policy_name,
            policy: self.policy,
            latency: self.latency,
            cancel: self.cancel,
            skipped: 0,
            done: false,
        }
    }

    /// Replays the whole trace.
    ///
    /// # Errors
    ///
    /// Returns the first [`RunError`]; records produced before it are discarded.
    pub fn run(self) -> Result<ReplayOutput, RunError> {
        let mut replay = self.records();
        let records = replay.by_ref().collect::<Result<Vec<_>, _>>()?;
        Ok(ReplayOutput {
            records,
            skipped: replay.skipped,
            counters: replay.policy.counters(),
            final_occupancy: replay.policy.occupancy(),
        })
    }
}

/// Iterator of [`RequestRecord`]s produced by a [`Replayer`].
///
/// Yields `Err` at most once, after which it is exhausted.
#[derive(Debug)]
pub struct Replay<'t> {
    events: slice::Iter<'t, TraceEvent>,
    policy_name: Arc<str>,
    policy: EvictionPolicy,
    latency: LatencyModel,
    cancel: CancelToken,
    skipped: u64,
    done: bool,
}

impl Replay<'_> {
    /// Events skipped so far because their key was invalid.
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Policy state as of the last yielded record.
    pub const fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }
}

impl Iterator for Replay<'_> {
    type Item = Result<RequestRecord, RunError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(event) = self.events.next() else {
                self.done = true;
                return None;
            };
            if self.cancel.is_cancelled() {
                self.done = true;
                return Some(Err(RunError::Cancelled(event.sequence_index)));
            }
            let outcome = match self.policy.access(&event.key) {
                Ok(outcome) => outcome,
                Err(mut err) => {
                    err.sequence_index = event.sequence_index;
                    warn!(policy = %self.policy_name, error = %err, "skipping trace event");
                    self.skipped += 1;
                    continue;
                }
            };
            return Some(match self.latency.simulate(outcome, event) {
                Ok(latency_ms) => Ok(RequestRecord {
                    sequence_index: event.sequence_index,
                    outcome,
                    latency_ms,
                    cost: event.cost,
                    policy_name: Arc::clone(&self.policy_name),
                }),
                Err(err) => {
                    self.done = true;
                    Err(err.into())
                }
            });
        }
    }
}

impl FusedIterator for Replay<'_> {}
