//! Latency model.
//!
//! Turns the Hit/Miss decision of a policy into a latency value, keeping the
//! timing concern out of the eviction logic. Three mutually exclusive modes:
//! 1. **Simulation:** Constant hit, cost-proportional miss; deterministic.
//! 2. **Mocked:** Seeded random hit jitter and miss spread; no waiting.
//! 3. **Real backend:** Constant hit, measured backend round trip on a miss.
//!
//! Only the real-backend mode blocks, and only inside the backend call.

/// Inference backend trait consumed by the real-backend mode.
pub mod backend;

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use backend::{BackendResponse, InferenceBackend};

use crate::common::{BackendError, ConfigError, Outcome};
use crate::config::{LatencyConfig, LatencyMode};
use crate::trace::TraceEvent;

enum Sampler {
    Simulation {
        hit_ms: f64,
        miss_base_ms: f64,
        miss_ms_per_cost: f64,
    },
    Mocked {
        hit_ms: f64,
        hit_jitter_ms: f64,
        miss_mean_ms: f64,
        miss_spread: f64,
        rng: StdRng,
    },
    RealBackend {
        hit_ms: f64,
        backend: Arc<dyn InferenceBackend>,
    },
}

/// Per-run latency model built from a [`LatencyConfig`].
///
/// A fresh model is built for every policy run so the mocked generator
/// restarts from its seed and runs stay comparable.
pub struct LatencyModel {
    sampler: Sampler,
}

impl fmt::Debug for LatencyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatencyModel")
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}

impl LatencyModel {
    /// Builds the model for `config`.
    ///
    /// `backend` is only consulted in real-backend mode and ignored otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBackend`] for real-backend mode without a
    /// backend, or [`ConfigError::InvalidLatency`] for a bad parameter.
    pub fn new(
        config: &LatencyConfig,
        backend: Option<Arc<dyn InferenceBackend>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let sampler = match *config {
            LatencyConfig::Simulation {
                hit_ms,
                miss_base_ms,
                miss_ms_per_cost,
            } => Sampler::Simulation {
                hit_ms,
                miss_base_ms,
                miss_ms_per_cost,
            },
            LatencyConfig::Mocked {
                hit_ms,
                hit_jitter_ms,
                miss_mean_ms,
                miss_spread,
                seed,
            } => Sampler::Mocked {
                hit_ms,
                hit_jitter_ms,
                miss_mean_ms,
                miss_spread,
                rng: StdRng::seed_from_u64(seed),
            },
            LatencyConfig::RealBackend { hit_ms } => Sampler::RealBackend {
                hit_ms,
                backend: backend.ok_or(ConfigError::MissingBackend)?,
            },
        };
        Ok(Self { sampler })
    }

    /// Mode the model was built for.
    pub const fn mode(&self) -> LatencyMode {
        match self.sampler {
            Sampler::Simulation { .. } => LatencyMode::Simulation,
            Sampler::Mocked { .. } => LatencyMode::Mocked,
            Sampler::RealBackend { .. } => LatencyMode::RealBackend,
        }
    }

    /// Latency in milliseconds of serving `event` with the given outcome.
    ///
    /// In real-backend mode a miss issues exactly one backend call.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`BackendError`] unchanged; no fallback latency
    /// is substituted.
    pub fn simulate(&mut self, outcome: Outcome, event: &TraceEvent) -> Result<f64, BackendError> {
        match &mut self.sampler {
            Sampler::Simulation {
                hit_ms,
                miss_base_ms,
                miss_ms_per_cost,
            } => Ok(match outcome {
                Outcome::Hit => *hit_ms,
                Outcome::Miss => event.cost.mul_add(*miss_ms_per_cost, *miss_base_ms),
            }),
            Sampler::Mocked {
                hit_ms,
                hit_jitter_ms,
                miss_mean_ms,
                miss_spread,
                rng,
            } => Ok(match outcome {
                Outcome::Hit if *hit_jitter_ms > 0.0 => {
                    *hit_ms + rng.gen_range(0.0..*hit_jitter_ms)
                }
                Outcome::Hit => *hit_ms,
                Outcome::Miss if *miss_spread > 0.0 => {
                    *miss_mean_ms * rng.gen_range((1.0 - *miss_spread)..(1.0 + *miss_spread))
                }
                Outcome::Miss => *miss_mean_ms,
            }),
            Sampler::RealBackend { hit_ms, backend } => match outcome {
                Outcome::Hit => Ok(*hit_ms),
                Outcome::Miss => {
                    let response = backend.invoke(&event.key)?;
                    Ok(response.elapsed.as_secs_f64() * 1000.0)
                }
            },
        }
    }
}
