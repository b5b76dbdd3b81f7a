//! Cache policy benchmark CLI.
//!
//! This binary replays one request trace against every configured eviction
//! policy and reports the comparison. It performs:
//! 1. **Configuration:** Optional JSON config file, overridden by flags.
//! 2. **Trace loading:** JSON trace file, or a deterministic synthetic stream.
//! 3. **Benchmark:** Simulated, mocked, or real (Ollama) miss latency.
//! 4. **Reporting:** Table on stdout, optional JSON and CSV files.

mod backend;
mod report;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cachebench_core::config::{
    BenchmarkConfig, LatencyConfig, LatencyMode, PolicyConfig, PolicyKind, TraceSource,
};
use cachebench_core::latency::InferenceBackend;
use cachebench_core::trace::{loader, synth};
use cachebench_core::{Benchmark, Trace};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::backend::OllamaBackend;

/// Prompts generated when no trace file is configured.
const FALLBACK_PROMPTS: usize = 200;

const LONG_ABOUT: &str = "\
Replay one recorded prompt trace against NoCache, LRU, and SLRU caches of
equal capacity and compare hit rate, latency, and miss cost.

Examples:
  cachebench --trace prompts.json --capacity 50
  cachebench --config bench.json --mode mocked --seed 7 --json results.json
  cachebench --trace prompts.json --mode real-backend --model phi3:mini";

#[derive(Parser, Debug)]
#[command(
    name = "cachebench",
    author,
    version,
    about = "Compare cache eviction policies on an inference request trace",
    long_about = LONG_ABOUT
)]
struct Cli {
    /// JSON benchmark configuration; flags override its fields.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON trace file. Without one a synthetic stream is replayed.
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Resident entries per policy.
    #[arg(long)]
    capacity: Option<usize>,

    /// Policy to evaluate; repeat for several. Replaces the configured list.
    #[arg(long = "policy", value_enum)]
    policies: Vec<PolicyArg>,

    /// Protected share of capacity for `--policy slru`.
    #[arg(long)]
    protected_ratio: Option<f64>,

    /// Latency model.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Run policies on a thread pool.
    #[arg(long)]
    parallel: bool,

    /// Keep at most this many trace events.
    #[arg(long)]
    limit: Option<usize>,

    /// Seed of the mocked latency generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Base URL of the Ollama server (real-backend mode).
    #[arg(long, default_value = "http://localhost:11434")]
    ollama_url: String,

    /// Model queried on a miss (real-backend mode).
    #[arg(long, default_value = "phi3:mini")]
    model: String,

    /// Per-request timeout in seconds (real-backend mode).
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Write the full comparison as JSON.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write summary rows as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    NoCache,
    Lru,
    Slru,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Simulation,
    Mocked,
    RealBackend,
}

impl From<ModeArg> for LatencyMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Simulation => Self::Simulation,
            ModeArg::Mocked => Self::Mocked,
            ModeArg::RealBackend => Self::RealBackend,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = build_config(cli)?;
    config.validate().context("invalid benchmark configuration")?;
    let trace = load_trace(&config.trace)?;
    let backend = match config.latency.mode() {
        LatencyMode::RealBackend => {
            let timeout = Duration::from_secs(cli.timeout_secs);
            let ollama = OllamaBackend::new(&cli.ollama_url, &cli.model, timeout)
                .context("failed to build HTTP client")?;
            info!(endpoint = ollama.endpoint(), model = %cli.model, "using ollama backend");
            Some(Arc::new(ollama) as Arc<dyn InferenceBackend>)
        }
        LatencyMode::Simulation | LatencyMode::Mocked => None,
    };

    let benchmark = Benchmark::new(config, backend).context("invalid benchmark configuration")?;
    let comparison = benchmark.run_all(&trace);

    report::print_table(benchmark.config(), trace.len(), &comparison)?;
    if let Some(path) = &cli.json {
        report::write_json(path, &comparison)?;
        info!(path = %path.display(), "wrote JSON results");
    }
    if let Some(path) = &cli.csv {
        report::write_csv(path, &comparison)?;
        info!(path = %path.display(), "wrote CSV results");
    }

    if comparison.all_failed() {
        error!("every policy run failed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Reads the config file, if any, and applies flag overrides.
fn build_config(cli: &Cli) -> Result<BenchmarkConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            BenchmarkConfig::from_json(&json)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => BenchmarkConfig::default(),
    };

    if let Some(capacity) = cli.capacity {
        config.capacity = capacity;
    }
    if !cli.policies.is_empty() {
        config.policies = cli
            .policies
            .iter()
            .map(|policy| match (policy, cli.protected_ratio) {
                (PolicyArg::NoCache, _) => PolicyKind::NoCache,
                (PolicyArg::Lru, _) => PolicyKind::Lru,
                (PolicyArg::Slru, Some(protected_ratio)) => PolicyKind::Slru { protected_ratio },
                (PolicyArg::Slru, None) => PolicyKind::slru(),
            })
            .map(PolicyConfig::from)
            .collect();
    }
    if let Some(mode) = cli.mode.map(LatencyMode::from) {
        if config.latency.mode() != mode {
            config.latency = LatencyConfig::for_mode(mode);
        }
    }
    if let Some(seed) = cli.seed {
        match &mut config.latency {
            LatencyConfig::Mocked { seed: current, .. } => *current = seed,
            LatencyConfig::Simulation { .. } | LatencyConfig::RealBackend { .. } => {
                warn!("--seed only affects mocked latency; ignoring");
            }
        }
    }
    config.parallel |= cli.parallel;
    if let Some(path) = &cli.trace {
        config.trace.path = Some(path.clone());
    }
    if let Some(limit) = cli.limit {
        config.trace.limit = Some(limit);
    }
    Ok(config)
}

fn load_trace(source: &TraceSource) -> Result<Trace> {
    let Some(path) = &source.path else {
        let limit = source.limit.unwrap_or(FALLBACK_PROMPTS);
        warn!(prompts = limit, "no trace file configured, replaying synthetic prompts");
        return Ok(loader::from_prompts(synth::fallback(limit)).trace);
    };
    let loaded = loader::load_json(path, source.limit)
        .with_context(|| format!("failed to load trace {}", path.display()))?;
    if loaded.skipped > 0 {
        warn!(skipped = loaded.skipped, "dropped malformed trace entries");
    }
    info!(
        path = %path.display(),
        events = loaded.trace.len(),
        distinct = loaded.trace.distinct_keys(),
        "trace loaded"
    );
    Ok(loaded.trace)
}
