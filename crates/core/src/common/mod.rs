//! Common types shared across the engine.
//!
//! This module provides:
//! 1. **Errors:** Configuration, key, backend, trace, and run failures.
//! 2. **Keys:** Prompt canonicalization and cost estimation.
//! 3. **Outcome:** The Hit/Miss result of a single cache access.

/// Error types for configuration, keys, backends, traces, and runs.
pub mod error;

/// Prompt canonicalization into cache keys.
pub mod key;

use serde::{Deserialize, Serialize};

pub use error::{BackendError, ConfigError, InvalidKeyError, RunError, TraceError};
pub use key::CacheKey;

/// Result of one cache access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The key was resident.
    Hit,
    /// The key was not resident and had to be computed.
    Miss,
}

impl Outcome {
    /// Returns `true` for [`Outcome::Hit`].
    #[inline]
    pub const fn is_hit(self) -> bool {
        matches!(self, Self::Hit)
    }
}
