//! Trace replay and benchmark orchestration.
//!
//! Provides the per-policy [`Replayer`] and the [`Benchmark`] that runs every
//! configured policy over one shared trace.

/// Cross-policy orchestration and the comparison table.
pub mod orchestrator;

/// Single-policy trace replay.
pub mod replayer;

pub use orchestrator::{Benchmark, Comparison, ComparisonEntry, PolicyOutcome, run_all};
pub use replayer::{CancelToken, Replay, ReplayOutput, Replayer};
