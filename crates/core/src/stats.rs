//! Benchmark statistics collection and aggregation.
//!
//! This module reduces the per-request record stream of one policy run into
//! comparable summary metrics. It provides:
//! 1. **Records:** [`RequestRecord`], one per replayed event.
//! 2. **Hit rate:** Hits over valid requests.
//! 3. **Latency:** Mean and nearest-rank p50/p95/p99 in milliseconds.
//! 4. **Cost:** Total cost of misses, the work a cache failed to avoid.
//! 5. **Throughput:** Policy-virtual throughput, requests per second of summed latency.
//!
//! Aggregation is a pure function of the records; it introduces no randomness.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::common::Outcome;
use crate::policy::PolicyCounters;

/// Output of one replay step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Sequence index of the replayed event.
    pub sequence_index: u64,
    /// Hit or miss.
    pub outcome: Outcome,
    /// Latency from the latency model, in milliseconds.
    pub latency_ms: f64,
    /// Cost of the event.
    pub cost: f64,
    /// Label of the policy that produced the record.
    pub policy_name: Arc<str>,
}

/// Aggregate result of one completed policy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Policy label.
    pub policy_name: String,
    /// Fraction of valid requests that hit, in [0, 1].
    pub hit_rate: f64,
    /// Mean latency in milliseconds.
    pub mean_latency: f64,
    /// 95th percentile latency (nearest rank) in milliseconds.
    pub p95_latency: f64,
    /// Sum of the cost of every miss.
    pub total_cost: f64,
    /// Number of replayed (valid) requests.
    pub requests: u64,
    /// Number of hits.
    pub hits: u64,
    /// Number of misses.
    pub misses: u64,
    /// Events skipped because their key was invalid.
    pub skipped: u64,
    /// Median latency (nearest rank) in milliseconds.
    pub p50_latency: f64,
    /// 99th percentile latency (nearest rank) in milliseconds.
    pub p99_latency: f64,
    /// Requests per second of summed latency.
    pub virtual_throughput: f64,
    /// Policy-internal counters at the end of the run.
    pub counters: PolicyCounters,
    /// Host wall-clock duration of the run, in seconds.
    pub wall_seconds: f64,
}

impl BenchmarkResult {
    /// Miss rate, `1 - hit_rate` for a non-empty run.
    pub fn miss_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.misses as f64 / self.requests as f64
        }
    }
}

/// Nearest-rank percentile of an ascending slice.
///
/// The value at rank `ceil(p / 100 * n)` (1-based, clamped to `[1, n]`).
/// Returns 0 for an empty slice.
///
/// # Arguments
///
/// * `sorted` - Values in ascending order.
/// * `p` - Percentile in [0, 100].
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    let rank = ((p / 100.0) * n as f64).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}

/// Reduces a run's records into a [`BenchmarkResult`].
///
/// Run-level fields the records cannot carry (`skipped`, `counters`,
/// `wall_seconds`) are left at zero for the caller to fill in.
pub fn aggregate(policy_name: &str, records: &[RequestRecord]) -> BenchmarkResult {
    let requests = records.len() as u64;
    let hits = records.iter().filter(|r| r.outcome.is_hit()).count() as u64;
    let misses = requests - hits;
    let total_cost: f64 = records
        .iter()
        .filter(|r| !r.outcome.is_hit())
        .map(|r| r.cost)
        .sum();

    let mut latencies: Vec<f64> = records.iter().map(|r| r.latency_ms).collect();
    latencies.sort_by(f64::total_cmp);
    let total_latency_ms: f64 = latencies.iter().sum();

    let (hit_rate, mean_latency) = if requests == 0 {
        (0.0, 0.0)
    } else {
        (
            hits as f64 / requests as f64,
            total_latency_ms / requests as f64,
        )
    };
    let virtual_throughput = if total_latency_ms > 0.0 {
        requests as f64 / (total_latency_ms / 1000.0)
    } else {
        0.0
    };

    BenchmarkResult {
        policy_name: policy_name.to_owned(),
        hit_rate,
        mean_latency,
        p95_latency: percentile(&latencies, 95.0),
        total_cost,
        requests,
        hits,
        misses,
        skipped: 0,
        p50_latency: percentile(&latencies, 50.0),
        p99_latency: percentile(&latencies, 99.0),
        virtual_throughput,
        counters: PolicyCounters::default(),
        wall_seconds: 0.0,
    }
}
