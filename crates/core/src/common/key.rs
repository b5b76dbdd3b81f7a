//! Cache key canonicalization.
//!
//! Raw prompts from recorded traces carry dataset noise (typographic quotes,
//! long dashes, irregular whitespace) that would split one logical request
//! into several cache identities. [`CacheKey::from_prompt`] folds that noise
//! away and attaches the cost estimate used for latency accounting.

use super::error::InvalidKeyError;

/// Approximate number of UTF-8 bytes per model token.
const BYTES_PER_TOKEN: usize = 4;

/// A canonical lookup key plus the inference cost a hit on it avoids.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    key: String,
    cost: f64,
}

impl CacheKey {
    /// Canonicalizes `raw` and estimates its cost from the canonical length.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidKeyError`] when nothing but whitespace remains.
    pub fn from_prompt(raw: &str) -> Result<Self, InvalidKeyError> {
        let key = canonicalize(raw);
        if key.is_empty() {
            return Err(InvalidKeyError { sequence_index: 0 });
        }
        let cost = estimate_cost(&key);
        Ok(Self { key, cost })
    }

    /// Canonicalizes `raw` and keeps an explicitly recorded cost.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidKeyError`] when nothing but whitespace remains.
    pub fn with_cost(raw: &str, cost: f64) -> Result<Self, InvalidKeyError> {
        let mut key = Self::from_prompt(raw)?;
        key.cost = cost;
        Ok(key)
    }

    /// The canonical key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Cost associated with the key (approximate tokens unless set explicitly).
    pub const fn cost(&self) -> f64 {
        self.cost
    }

    /// Splits the key into its string and cost.
    pub fn into_parts(self) -> (String, f64) {
        (self.key, self.cost)
    }
}

/// Normalizes quotes and dashes, collapses whitespace runs, and trims.
pub fn canonicalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(match ch {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{2013}' | '\u{2014}' => '-',
            other => other,
        });
    }
    out
}

/// Estimates the token count of a canonical key, never less than one.
pub fn estimate_cost(key: &str) -> f64 {
    key.len().div_ceil(BYTES_PER_TOKEN).max(1) as f64
}
