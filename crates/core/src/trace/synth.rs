//! Synthetic prompt streams.
//!
//! Recorded datasets rarely contain exact repeats, which makes every policy
//! look the same. These generators produce streams with controlled reuse.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::common::TraceError;

/// Repeats the first `n_unique` prompts `repeats` times each, shuffles, and
/// keeps the first `total`.
///
/// The shuffle is seeded, so a given seed always yields the same stream.
///
/// # Errors
///
/// Returns [`TraceError::NotEnoughPrompts`] when fewer than `n_unique`
/// prompts are supplied.
pub fn with_repeats(
    prompts: &[String],
    n_unique: usize,
    repeats: usize,
    total: usize,
    seed: u64,
) -> Result<Vec<String>, TraceError> {
    if prompts.len() < n_unique {
        return Err(TraceError::NotEnoughPrompts {
            available: prompts.len(),
            requested: n_unique,
        });
    }
    let mut stream: Vec<String> = prompts[..n_unique]
        .iter()
        .flat_map(|p| std::iter::repeat_n(p.clone(), repeats))
        .collect();
    stream.shuffle(&mut StdRng::seed_from_u64(seed));
    stream.truncate(total);
    Ok(stream)
}

/// Deterministic stream of `limit` prompts over seven templates, with an
/// extra look-back duplicate injected every fifth prompt.
///
/// Used when no trace file is configured.
pub fn fallback(limit: usize) -> Vec<String> {
    let base: Vec<String> = (0..limit.max(2))
        .map(|i| format!("what did NAME_{} do to his sister", i % 7))
        .collect();
    let mut out = Vec::with_capacity(limit);
    for i in 0..limit {
        out.push(base[i % base.len()].clone());
        if i % 5 == 4 && i >= 6 {
            out.push(base[(i - 6) % base.len()].clone());
        }
        if out.len() >= limit {
            break;
        }
    }
    out.truncate(limit);
    out
}
