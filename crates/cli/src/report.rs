//! Comparison reporting.
//!
//! Renders a [`Comparison`] as:
//! 1. **Table:** Fixed-width summary on stdout, failed runs marked `FAILED`.
//! 2. **JSON:** The whole comparison, including policy counters.
//! 3. **CSV:** One summary row per policy.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use cachebench_core::config::BenchmarkConfig;
use cachebench_core::sim::{Comparison, PolicyOutcome};

const RULE: &str = "==========================================================================";
const THIN: &str = "--------------------------------------------------------------------------";

/// Writes the comparison table.
///
/// # Errors
///
/// Returns the I/O error of the underlying writer.
pub fn write_table<W: Write>(
    out: &mut W,
    config: &BenchmarkConfig,
    events: usize,
    comparison: &Comparison,
) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "CACHE POLICY BENCHMARK")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "trace_events             {events}")?;
    writeln!(out, "capacity                 {}", config.capacity)?;
    writeln!(out, "latency_mode             {:?}", config.latency.mode())?;
    writeln!(out, "{THIN}")?;
    writeln!(
        out,
        "{:<16} {:>8} {:>10} {:>10} {:>10} {:>12} {:>8}",
        "policy", "hit_rate", "mean_ms", "p50_ms", "p95_ms", "miss_cost", "skipped"
    )?;
    for entry in comparison {
        match &entry.outcome {
            PolicyOutcome::Completed(r) => writeln!(
                out,
                "{:<16} {:>7.2}% {:>10.2} {:>10.2} {:>10.2} {:>12.1} {:>8}",
                entry.policy_name,
                r.hit_rate * 100.0,
                r.mean_latency,
                r.p50_latency,
                r.p95_latency,
                r.total_cost,
                r.skipped
            )?,
            PolicyOutcome::Failed { reason } => {
                writeln!(out, "{:<16} FAILED: {reason}", entry.policy_name)?;
            }
        }
    }
    writeln!(out, "{RULE}")?;
    Ok(())
}

/// Prints the comparison table to stdout.
pub fn print_table(config: &BenchmarkConfig, events: usize, comparison: &Comparison) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_table(&mut out, config, events, comparison).context("failed to print results")?;
    out.flush().context("failed to flush stdout")
}

/// Writes the full comparison as pretty-printed JSON.
pub fn write_json(path: &Path, comparison: &Comparison) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, comparison)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Writes summary rows to `out` as CSV.
///
/// # Errors
///
/// Returns the I/O error of the underlying writer.
pub fn write_csv_rows<W: Write>(out: &mut W, comparison: &Comparison) -> io::Result<()> {
    writeln!(out, "policy,hit_rate,mean_ms,p95_ms,total_cost,status")?;
    for entry in comparison {
        match &entry.outcome {
            PolicyOutcome::Completed(r) => writeln!(
                out,
                "{},{:.6},{:.3},{:.3},{:.3},completed",
                csv_field(&entry.policy_name),
                r.hit_rate,
                r.mean_latency,
                r.p95_latency,
                r.total_cost
            )?,
            PolicyOutcome::Failed { .. } => {
                writeln!(out, "{},,,,,failed", csv_field(&entry.policy_name))?;
            }
        }
    }
    Ok(())
}

/// Writes summary rows to a CSV file.
pub fn write_csv(path: &Path, comparison: &Comparison) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_csv_rows(&mut out, comparison)
        .with_context(|| format!("failed to write {}", path.display()))?;
    out.flush()?;
    Ok(())
}

/// Quotes a field containing a separator, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}
