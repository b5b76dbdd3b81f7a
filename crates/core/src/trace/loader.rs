//! JSON trace loader.
//!
//! Accepts a JSON array whose entries take any of the shapes found in the
//! recorded prompt datasets:
//!
//! ```json
//! [
//!   {"prompt": "Explain BLE advertising briefly.", "id": 0},
//!   {"key": "cached-identifier", "sequence_index": 3, "cost": 12.5},
//!   {"conversation": [
//!     {"role": "user", "content": "hi"},
//!     {"role": "assistant", "content": "hello"}
//!   ]},
//!   {"conversation": [{"user": "older export format"}]}
//! ]
//! ```
//!
//! Prompts are canonicalized into cache keys. Entries without usable text,
//! with an empty canonical key, or with a non-positive cost are skipped with a
//! warning, so only well-formed events reach the replayer. Explicit indexes
//! that go backwards reject the whole file. Implicit indexes continue from the
//! previous event.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{Trace, TraceEvent};
use crate::common::{CacheKey, TraceError};

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default, alias = "id")]
    sequence_index: Option<u64>,
    #[serde(default, alias = "key")]
    prompt: Option<String>,
    #[serde(default)]
    cost: Option<f64>,
    #[serde(default)]
    conversation: Option<Vec<RawTurn>>,
}

#[derive(Debug, Deserialize)]
struct RawTurn {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    user: Option<String>,
}

impl RawTurn {
    fn user_text(self) -> Option<String> {
        if let Some(text) = self.user {
            return Some(text);
        }
        match self.role.as_deref() {
            Some("user") => self.content,
            _ => None,
        }
    }
}

/// A loaded trace plus the number of entries that were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTrace {
    /// Validated events.
    pub trace: Trace,
    /// Entries skipped as malformed.
    pub skipped: usize,
}

/// Incremental builder that numbers, validates, and counts events.
#[derive(Debug)]
struct Collector {
    events: Vec<TraceEvent>,
    skipped: usize,
    /// `None` once an event used `u64::MAX`.
    next_index: Option<u64>,
    limit: Option<usize>,
}

impl Collector {
    const fn new(limit: Option<usize>) -> Self {
        Self {
            events: Vec::new(),
            skipped: 0,
            next_index: Some(0),
            limit,
        }
    }

    fn full(&self) -> bool {
        self.limit.is_some_and(|limit| self.events.len() >= limit)
    }

    fn push(
        &mut self,
        index: Option<u64>,
        text: &str,
        cost: Option<f64>,
    ) -> Result<(), TraceError> {
        let sequence_index = match (index, self.next_index) {
            (Some(index), _) => index,
            (None, Some(next)) => next,
            (None, None) => return Err(TraceError::IndexOverflow),
        };
        if let Some(previous) = self.events.last().map(|e| e.sequence_index) {
            if sequence_index <= previous {
                return Err(TraceError::NonIncreasingIndex {
                    previous,
                    current: sequence_index,
                });
            }
        }
        let key = match cost {
            Some(cost) => CacheKey::with_cost(text, cost),
            None => CacheKey::from_prompt(text),
        };
        let Ok(key) = key else {
            warn!(sequence_index, "skipping trace entry with empty key");
            self.skipped += 1;
            return Ok(());
        };
        if !(key.cost().is_finite() && key.cost() > 0.0) {
            warn!(
                sequence_index,
                cost = key.cost(),
                "skipping trace entry with invalid cost"
            );
            self.skipped += 1;
            return Ok(());
        }
        let (key, cost) = key.into_parts();
        self.events.push(TraceEvent::new(sequence_index, key, cost));
        self.next_index = sequence_index.checked_add(1);
        Ok(())
    }

    fn finish(self) -> Result<LoadedTrace, TraceError> {
        debug!(events = self.events.len(), skipped = self.skipped, "trace loaded");
        Ok(LoadedTrace {
            trace: Trace::new(self.events)?,
            skipped: self.skipped,
        })
    }
}

/// Parses a JSON trace from a string.
///
/// # Arguments
///
/// * `json` - The JSON array, optionally prefixed by a UTF-8 byte order mark.
/// * `limit` - Keep at most this many events.
///
/// # Errors
///
/// Returns [`TraceError::Json`] for malformed JSON,
/// [`TraceError::NonIncreasingIndex`] for explicit indexes out of order, and
/// [`TraceError::IndexOverflow`] for an implicit index after `u64::MAX`.
pub fn parse_json(json: &str, limit: Option<usize>) -> Result<LoadedTrace, TraceError> {
    let json = json.strip_prefix('\u{feff}').unwrap_or(json);
    let entries: Vec<RawEntry> = serde_json::from_str(json)?;
    let mut collector = Collector::new(limit);

    for entry in entries {
        if collector.full() {
            break;
        }
        if let Some(prompt) = entry.prompt {
            collector.push(entry.sequence_index, &prompt, entry.cost)?;
        } else if let Some(turns) = entry.conversation {
            for text in turns.into_iter().filter_map(RawTurn::user_text) {
                if collector.full() {
                    break;
                }
                collector.push(None, &text, None)?;
            }
        } else {
            warn!(
                sequence_index = entry.sequence_index,
                "skipping trace entry without prompt or conversation"
            );
            collector.skipped += 1;
        }
    }
    collector.finish()
}

/// Reads and parses a JSON trace file.
///
/// # Errors
///
/// Returns [`TraceError::Io`] when the file cannot be read, otherwise see
/// [`parse_json`].
pub fn load_json(path: &Path, limit: Option<usize>) -> Result<LoadedTrace, TraceError> {
    let json = fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&json, limit)
}

/// Builds a trace from raw prompts, numbered from zero.
///
/// Prompts are canonicalized and costed like file entries; empty ones are
/// skipped and counted.
pub fn from_prompts<I, S>(prompts: I) -> LoadedTrace
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut events = Vec::new();
    let mut skipped = 0;
    for (i, prompt) in prompts.into_iter().enumerate() {
        match CacheKey::from_prompt(prompt.as_ref()) {
            Ok(key) => {
                let (key, cost) = key.into_parts();
                events.push(TraceEvent::new(i as u64, key, cost));
            }
            Err(_) => {
                warn!(sequence_index = i, "skipping empty prompt");
                skipped += 1;
            }
        }
    }
    // Indexes are increasing by construction and estimated costs are >= 1.
    let trace = Trace::new(events).unwrap_or_default();
    LoadedTrace { trace, skipped }
}
