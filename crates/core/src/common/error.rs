//! Error taxonomy for the benchmark engine.
//!
//! This module defines every failure the engine can report. It provides:
//! 1. **Configuration errors:** Rejected before any trace replay starts.
//! 2. **Key errors:** A single malformed event, skipped without aborting the run.
//! 3. **Backend errors:** A failed inference call, which aborts one policy's run.
//! 4. **Trace and run errors:** Loader rejections, cancellation, and wrapping.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid benchmark or policy configuration.
///
/// Always raised before any trace event is replayed so that no external
/// inference cost is spent on a run that cannot complete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Capacity must be a positive number of entries.
    #[error("invalid capacity {0}: a policy needs room for at least one entry")]
    InvalidCapacity(usize),

    /// At least one policy must be configured.
    #[error("no policies configured")]
    EmptyPolicyList,

    /// The SLRU protected ratio or capacity does not allow two non-empty segments.
    #[error("invalid SLRU segment split: ratio {ratio} with capacity {capacity}")]
    InvalidSegmentSplit {
        /// Requested fraction of capacity reserved for the protected segment.
        ratio: f64,
        /// Total capacity the split was applied to.
        capacity: usize,
    },

    /// Two policies resolved to the same label, so results could not be keyed.
    #[error("policy label '{0}' is configured more than once")]
    DuplicatePolicy(String),

    /// Real-backend latency mode was selected without an inference backend.
    #[error("latency mode RealBackend requires an inference backend")]
    MissingBackend,

    /// A latency-model parameter is negative or not finite.
    #[error("invalid latency parameter {name} = {value}")]
    InvalidLatency {
        /// Name of the offending field.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
}

/// A trace event whose key cannot be used for a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cache key at sequence index {sequence_index}: key is empty")]
pub struct InvalidKeyError {
    /// Sequence index of the rejected event (0 when not known at the call site).
    pub sequence_index: u64,
}

/// Failure of the external inference backend.
///
/// Never retried by the engine; the first occurrence aborts the current run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The request could not be sent or timed out.
    #[error("backend request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {0}")]
    Status(u16),

    /// The response body could not be decoded.
    #[error("backend response could not be decoded: {0}")]
    Decode(String),

    /// The backend is not reachable or refused the call.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Rejection of a trace before it reaches the replayer.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be read.
    #[error("failed to read trace {path}: {source}")]
    Io {
        /// Path of the trace file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The trace file is not valid JSON of the expected shape.
    #[error("malformed trace JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Sequence indexes must be strictly increasing.
    #[error("sequence index {current} does not follow {previous}")]
    NonIncreasingIndex {
        /// Index of the preceding event.
        previous: u64,
        /// Offending index.
        current: u64,
    },

    /// An entry without an explicit index follows the event at `u64::MAX`.
    #[error("no sequence index left after {}", u64::MAX)]
    IndexOverflow,

    /// Event cost must be positive and finite.
    #[error("invalid cost {cost} at sequence index {sequence_index}")]
    InvalidCost {
        /// Index of the offending event.
        sequence_index: u64,
        /// Rejected cost.
        cost: f64,
    },

    /// A synthetic trace asked for more distinct prompts than are available.
    #[error("only {available} prompts available, {requested} requested")]
    NotEnoughPrompts {
        /// Number of prompts supplied.
        available: usize,
        /// Number of prompts requested.
        requested: usize,
    },
}

/// Failure that aborts a single policy run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    /// The policy or latency model could not be built.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The latency model's backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The run was cancelled between two trace events.
    #[error("run cancelled before sequence index {0}")]
    Cancelled(u64),
}
