//! Cache-eviction policy benchmark for inference serving.
//!
//! This crate replays a recorded request trace against candidate caches and
//! measures hit rate and end-to-end latency with the following:
//! 1. **Policies:** No-cache baseline, LRU, and Segmented LRU with O(1) access.
//! 2. **Latency:** Simulated, mocked, or measured real-backend miss latency.
//! 3. **Traces:** Validated event sequences, JSON loading, synthetic streams.
//! 4. **Simulation:** Per-policy replay and cross-policy orchestration.
//! 5. **Statistics:** Hit rate, mean/percentile latency, and miss cost.

/// Common types (errors, cache keys, outcomes).
pub mod common;
/// Benchmark configuration (defaults, policy and latency enums, validation).
pub mod config;
/// Latency model and the inference backend interface.
pub mod latency;
/// Eviction policies (no-cache, LRU, SLRU).
pub mod policy;
/// Trace replay and benchmark orchestration.
pub mod sim;
/// Record aggregation into benchmark results.
pub mod stats;
/// Request traces, loading, and synthesis.
pub mod trace;

/// Root configuration type; use `BenchmarkConfig::default()` or deserialize from JSON.
pub use crate::config::BenchmarkConfig;
/// Validated benchmark; construct with `Benchmark::new` and call `run_all`.
pub use crate::sim::Benchmark;
/// Shared, validated request trace.
pub use crate::trace::Trace;
