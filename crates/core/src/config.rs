//! Configuration system for the policy benchmark.
//!
//! This module defines all configuration structures and enums used to
//! parameterize a benchmark. It provides:
//! 1. **Defaults:** Baseline capacity, segment split, and latency constants.
//! 2. **Structures:** Benchmark, policy, latency, and trace-source configuration.
//! 3. **Validation:** Fail-fast checks performed before any trace replay.
//!
//! Configuration is supplied as JSON (`BenchmarkConfig::from_json`) or built
//! with `BenchmarkConfig::default()` and overridden field by field from the CLI.
//! The value is immutable once handed to [`crate::sim::Benchmark`].

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;
use crate::policy::slru::SegmentSplit;

/// Default configuration constants for the benchmark.
///
/// These values reproduce the baseline experiment when not explicitly
/// overridden in a JSON configuration file.
mod defaults {
    /// Resident entries per policy run.
    pub const CAPACITY: usize = 100;

    /// Share of SLRU capacity reserved for the protected segment.
    pub const PROTECTED_RATIO: f64 = 0.5;

    /// Latency of serving a response from the cache, in milliseconds.
    pub const HIT_MS: f64 = 5.0;

    /// Fixed part of a simulated miss, in milliseconds.
    pub const MISS_BASE_MS: f64 = 50.0;

    /// Simulated miss latency per unit of event cost, in milliseconds.
    pub const MISS_MS_PER_COST: f64 = 2.0;

    /// Upper bound of the uniform jitter added to a mocked hit, in milliseconds.
    pub const MOCK_HIT_JITTER_MS: f64 = 1.0;

    /// Centre of the mocked miss latency distribution (one second), in milliseconds.
    pub const MOCK_MISS_MEAN_MS: f64 = 1000.0;

    /// Relative half-width of the mocked miss distribution.
    pub const MOCK_MISS_SPREAD: f64 = 0.2;

    /// Seed of the mocked latency generator.
    pub const MOCK_SEED: u64 = 42;
}

/// Eviction policy variant and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PolicyKind {
    /// Baseline with no caching benefit: every access misses.
    #[serde(alias = "NOCACHE", alias = "no_cache", alias = "None")]
    NoCache,
    /// Least Recently Used eviction.
    #[serde(alias = "LRU", alias = "lru")]
    Lru,
    /// Segmented LRU with probationary and protected segments.
    #[serde(alias = "SLRU", alias = "slru")]
    Slru {
        /// Fraction of capacity given to the protected segment, in (0, 1).
        #[serde(default = "PolicyKind::default_protected_ratio")]
        protected_ratio: f64,
    },
}

impl PolicyKind {
    fn default_protected_ratio() -> f64 {
        defaults::PROTECTED_RATIO
    }

    /// SLRU with the default half/half split.
    pub const fn slru() -> Self {
        Self::Slru {
            protected_ratio: defaults::PROTECTED_RATIO,
        }
    }
}

/// One entry of the ordered policy list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Variant and parameters.
    #[serde(flatten)]
    pub kind: PolicyKind,
    /// Optional label overriding the derived one (needed for two SLRU splits
    /// that would otherwise collide).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PolicyConfig {
    /// Policy config with the derived label.
    pub const fn new(kind: PolicyKind) -> Self {
        Self { kind, name: None }
    }

    /// Label under which the policy's result is reported.
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match self.kind {
            PolicyKind::NoCache => "no_cache".to_owned(),
            PolicyKind::Lru => "lru".to_owned(),
            PolicyKind::Slru { protected_ratio }
                if (protected_ratio - defaults::PROTECTED_RATIO).abs() < f64::EPSILON =>
            {
                "slru".to_owned()
            }
            PolicyKind::Slru { protected_ratio } => format!("slru-{protected_ratio}"),
        }
    }
}

impl From<PolicyKind> for PolicyConfig {
    fn from(kind: PolicyKind) -> Self {
        Self::new(kind)
    }
}

/// Latency model mode, without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatencyMode {
    /// Deterministic constants derived from event cost.
    Simulation,
    /// Seeded random latencies approximating a real backend.
    Mocked,
    /// Measured round trips to the inference backend.
    RealBackend,
}

/// Latency model configuration. The three modes are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum LatencyConfig {
    /// Pure simulation: no waiting, fully deterministic.
    Simulation {
        /// Latency of a hit, in milliseconds.
        #[serde(default = "LatencyConfig::default_hit_ms")]
        hit_ms: f64,
        /// Fixed part of a miss, in milliseconds.
        #[serde(default = "LatencyConfig::default_miss_base_ms")]
        miss_base_ms: f64,
        /// Miss latency per unit of event cost, in milliseconds.
        #[serde(default = "LatencyConfig::default_miss_ms_per_cost")]
        miss_ms_per_cost: f64,
    },
    /// Mocked latency: sampled, seeded, no external calls and no waiting.
    Mocked {
        /// Base latency of a hit, in milliseconds.
        #[serde(default = "LatencyConfig::default_hit_ms")]
        hit_ms: f64,
        /// Upper bound of the jitter added to a hit, in milliseconds.
        #[serde(default = "LatencyConfig::default_hit_jitter_ms")]
        hit_jitter_ms: f64,
        /// Centre of the miss distribution, in milliseconds.
        #[serde(default = "LatencyConfig::default_miss_mean_ms")]
        miss_mean_ms: f64,
        /// Relative half-width of the miss distribution, in [0, 1).
        #[serde(default = "LatencyConfig::default_miss_spread")]
        miss_spread: f64,
        /// Generator seed; each run restarts from it.
        #[serde(default = "LatencyConfig::default_seed")]
        seed: u64,
    },
    /// Real backend: a miss is the measured time of one backend call.
    RealBackend {
        /// Latency of a hit, in milliseconds.
        #[serde(default = "LatencyConfig::default_hit_ms")]
        hit_ms: f64,
    },
}

impl LatencyConfig {
    fn default_hit_ms() -> f64 {
        defaults::HIT_MS
    }

    fn default_miss_base_ms() -> f64 {
        defaults::MISS_BASE_MS
    }

    fn default_miss_ms_per_cost() -> f64 {
        defaults::MISS_MS_PER_COST
    }

    fn default_hit_jitter_ms() -> f64 {
        defaults::MOCK_HIT_JITTER_MS
    }

    fn default_miss_mean_ms() -> f64 {
        defaults::MOCK_MISS_MEAN_MS
    }

    fn default_miss_spread() -> f64 {
        defaults::MOCK_MISS_SPREAD
    }

    fn default_seed() -> u64 {
        defaults::MOCK_SEED
    }

    /// Simulation mode with default constants.
    pub const fn simulation() -> Self {
        Self::Simulation {
            hit_ms: defaults::HIT_MS,
            miss_base_ms: defaults::MISS_BASE_MS,
            miss_ms_per_cost: defaults::MISS_MS_PER_COST,
        }
    }

    /// Mocked mode with default distribution parameters and the given seed.
    pub const fn mocked(seed: u64) -> Self {
        Self::Mocked {
            hit_ms: defaults::HIT_MS,
            hit_jitter_ms: defaults::MOCK_HIT_JITTER_MS,
            miss_mean_ms: defaults::MOCK_MISS_MEAN_MS,
            miss_spread: defaults::MOCK_MISS_SPREAD,
            seed,
        }
    }

    /// Real-backend mode with the default hit latency.
    pub const fn real_backend() -> Self {
        Self::RealBackend {
            hit_ms: defaults::HIT_MS,
        }
    }

    /// Default parameters for `mode`.
    pub const fn for_mode(mode: LatencyMode) -> Self {
        match mode {
            LatencyMode::Simulation => Self::simulation(),
            LatencyMode::Mocked => Self::mocked(defaults::MOCK_SEED),
            LatencyMode::RealBackend => Self::real_backend(),
        }
    }

    /// The mode this configuration selects.
    pub const fn mode(&self) -> LatencyMode {
        match self {
            Self::Simulation { .. } => LatencyMode::Simulation,
            Self::Mocked { .. } => LatencyMode::Mocked,
            Self::RealBackend { .. } => LatencyMode::RealBackend,
        }
    }

    /// Rejects negative or non-finite parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLatency`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |name: &'static str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidLatency { name, value })
            }
        };
        match *self {
            Self::Simulation {
                hit_ms,
                miss_base_ms,
                miss_ms_per_cost,
            } => {
                check("hit_ms", hit_ms)?;
                check("miss_base_ms", miss_base_ms)?;
                check("miss_ms_per_cost", miss_ms_per_cost)
            }
            Self::Mocked {
                hit_ms,
                hit_jitter_ms,
                miss_mean_ms,
                miss_spread,
                ..
            } => {
                check("hit_ms", hit_ms)?;
                check("hit_jitter_ms", hit_jitter_ms)?;
                check("miss_mean_ms", miss_mean_ms)?;
                check("miss_spread", miss_spread)?;
                if miss_spread >= 1.0 {
                    return Err(ConfigError::InvalidLatency {
                        name: "miss_spread",
                        value: miss_spread,
                    });
                }
                Ok(())
            }
            Self::RealBackend { hit_ms } => check("hit_ms", hit_ms),
        }
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self::simulation()
    }
}

/// Where the trace comes from; interpreted by the trace loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSource {
    /// JSON trace file. When absent the deterministic fallback stream is used.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Keep at most this many events.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Root configuration of one benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Eviction budget (resident entries) given to every policy.
    #[serde(default = "BenchmarkConfig::default_capacity")]
    pub capacity: usize,
    /// Policies to evaluate, in evaluation and reporting order.
    #[serde(default = "BenchmarkConfig::default_policies")]
    pub policies: Vec<PolicyConfig>,
    /// Latency model shared (as configuration) by every run.
    #[serde(default)]
    pub latency: LatencyConfig,
    /// Run independent policies on a thread pool.
    #[serde(default)]
    pub parallel: bool,
    /// Trace handle for the loader.
    #[serde(default)]
    pub trace: TraceSource,
}

impl BenchmarkConfig {
    fn default_capacity() -> usize {
        defaults::CAPACITY
    }

    fn default_policies() -> Vec<PolicyConfig> {
        vec![
            PolicyKind::NoCache.into(),
            PolicyKind::Lru.into(),
            PolicyKind::slru().into(),
        ]
    }

    /// Parses a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Checks everything that can be checked without replaying the trace.
    ///
    /// The backend requirement of [`LatencyMode::RealBackend`] is checked by
    /// [`crate::sim::Benchmark::new`], which is the first place a backend is known.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, in field order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity(self.capacity));
        }
        if self.policies.is_empty() {
            return Err(ConfigError::EmptyPolicyList);
        }
        let mut seen = HashSet::with_capacity(self.policies.len());
        for policy in &self.policies {
            if let PolicyKind::Slru { protected_ratio } = policy.kind {
                let _split = SegmentSplit::new(self.capacity, protected_ratio)?;
            }
            let label = policy.label();
            if !seen.insert(label.clone()) {
                return Err(ConfigError::DuplicatePolicy(label));
            }
        }
        self.latency.validate()
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::CAPACITY,
            policies: Self::default_policies(),
            latency: LatencyConfig::default(),
            parallel: false,
            trace: TraceSource::default(),
        }
    }
}
