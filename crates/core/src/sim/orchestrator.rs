//! Benchmark orchestrator.
//!
//! Runs every configured policy once over the same trace and capacity and
//! collects the results into an ordered [`Comparison`]. The policy is the only
//! variable between runs: each run starts from an empty policy and a latency
//! model rebuilt from the same configuration.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::replayer::{CancelToken, Replayer};
use crate::common::{ConfigError, RunError};
use crate::config::{BenchmarkConfig, LatencyConfig, LatencyMode, PolicyConfig};
use crate::latency::{InferenceBackend, LatencyModel};
use crate::policy::EvictionPolicy;
use crate::stats::{BenchmarkResult, aggregate};
use crate::trace::Trace;

/// Result slot of one policy in a [`Comparison`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PolicyOutcome {
    /// The run replayed the whole trace.
    Completed(BenchmarkResult),
    /// The run was aborted; no partial metrics are reported.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

impl PolicyOutcome {
    /// The result of a completed run.
    pub const fn result(&self) -> Option<&BenchmarkResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Failed { .. } => None,
        }
    }

    /// Returns `true` for a failed run.
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Entry of a [`Comparison`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    /// Policy label.
    pub policy_name: String,
    /// Completed result or failure marker.
    #[serde(flatten)]
    pub outcome: PolicyOutcome,
}

/// Policy label to outcome, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Comparison {
    entries: Vec<ComparisonEntry>,
}

impl Comparison {
    /// Outcome for `policy_name`.
    pub fn get(&self, policy_name: &str) -> Option<&PolicyOutcome> {
        self.entries
            .iter()
            .find(|e| e.policy_name == policy_name)
            .map(|e| &e.outcome)
    }

    /// Entries in evaluation order.
    pub fn iter(&self) -> std::slice::Iter<'_, ComparisonEntry> {
        self.entries.iter()
    }

    /// Completed results in evaluation order.
    pub fn completed(&self) -> impl Iterator<Item = &BenchmarkResult> + '_ {
        self.entries.iter().filter_map(|e| e.outcome.result())
    }

    /// Labels and reasons of failed runs in evaluation order.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().filter_map(|e| match &e.outcome {
            PolicyOutcome::Failed { reason } => Some((e.policy_name.as_str(), reason.as_str())),
            PolicyOutcome::Completed(_) => None,
        })
    }

    /// Number of evaluated policies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no policy was evaluated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` when every evaluated policy failed.
    pub fn all_failed(&self) -> bool {
        self.entries.iter().all(|e| e.outcome.is_failed())
    }
}

impl<'a> IntoIterator for &'a Comparison {
    type Item = &'a ComparisonEntry;
    type IntoIter = std::slice::Iter<'a, ComparisonEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A validated benchmark ready to run.
pub struct Benchmark {
    config: BenchmarkConfig,
    backend: Option<Arc<dyn InferenceBackend>>,
    cancel: CancelToken,
}

impl std::fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benchmark")
            .field("config", &self.config)
            .field("backend", &self.backend.is_some())
            .finish_non_exhaustive()
    }
}

impl Benchmark {
    /// Validates `config` and binds the backend used in real-backend mode.
    ///
    /// Nothing is replayed here; every configuration problem surfaces before
    /// the first backend call could be made.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] of [`BenchmarkConfig::validate`], or
    /// [`ConfigError::MissingBackend`] for real-backend mode without a backend.
    pub fn new(
        config: BenchmarkConfig,
        backend: Option<Arc<dyn InferenceBackend>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.latency.mode() == LatencyMode::RealBackend && backend.is_none() {
            return Err(ConfigError::MissingBackend);
        }
        Ok(Self {
            config,
            backend,
            cancel: CancelToken::new(),
        })
    }

    /// The validated configuration.
    pub const fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Token that aborts every run of this benchmark between trace events.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs every policy over `trace` and returns the table in configured order.
    ///
    /// With `parallel` set, runs execute on the rayon pool; the table order is
    /// the configured order either way.
    pub fn run_all(&self, trace: &Trace) -> Comparison {
        info!(
            policies = self.config.policies.len(),
            events = trace.len(),
            capacity = self.config.capacity,
            mode = ?self.config.latency.mode(),
            "starting benchmark"
        );
        let entries = if self.config.parallel {
            self.config
                .policies
                .par_iter()
                .map(|policy| self.evaluate(policy, trace))
                .collect()
        } else {
            self.config
                .policies
                .iter()
                .map(|policy| self.evaluate(policy, trace))
                .collect()
        };
        Comparison { entries }
    }

    /// Runs one policy and returns its result.
    ///
    /// # Errors
    ///
    /// Returns the [`RunError`] that aborted the run.
    pub fn run_policy(
        &self,
        policy: &PolicyConfig,
        trace: &Trace,
    ) -> Result<BenchmarkResult, RunError> {
        let label = policy.label();
        let started = Instant::now();
        let eviction = EvictionPolicy::new(&policy.kind, self.config.capacity)?;
        let latency = LatencyModel::new(&self.config.latency, self.backend.clone())?;
        let output = Replayer::new(&label, trace, eviction, latency)
            .with_cancel(self.cancel.clone())
            .run()?;

        let mut result = aggregate(&label, &output.records);
        result.skipped = output.skipped;
        result.counters = output.counters;
        result.wall_seconds = started.elapsed().as_secs_f64();
        Ok(result)
    }

    fn evaluate(&self, policy: &PolicyConfig, trace: &Trace) -> ComparisonEntry {
        let policy_name = policy.label();
        let outcome = match self.run_policy(policy, trace) {
            Ok(result) => {
                info!(
                    policy = %policy_name,
                    hit_rate = result.hit_rate,
                    mean_ms = result.mean_latency,
                    p95_ms = result.p95_latency,
                    "run completed"
                );
                PolicyOutcome::Completed(result)
            }
            Err(err) => {
                warn!(policy = %policy_name, error = %err, "run failed");
                PolicyOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };
        ComparisonEntry {
            policy_name,
            outcome,
        }
    }
}

/// Validates and runs a benchmark in one call, sequentially.
///
/// # Errors
///
/// Returns a [`ConfigError`] before any replay when the capacity, policy list,
/// or latency configuration is invalid.
pub fn run_all(
    trace: &Trace,
    capacity: usize,
    policies: &[PolicyConfig],
    latency: &LatencyConfig,
    backend: Option<Arc<dyn InferenceBackend>>,
) -> Result<Comparison, ConfigError> {
    let config = BenchmarkConfig {
        capacity,
        policies: policies.to_vec(),
        latency: latency.clone(),
        ..BenchmarkConfig::default()
    };
    Ok(Benchmark::new(config, backend)?.run_all(trace))
}
