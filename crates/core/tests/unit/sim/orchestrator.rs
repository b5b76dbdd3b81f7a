//! # Orchestrator Tests
//!
//! End-to-end comparisons over shared traces.

use std::sync::Arc;

use cachebench_core::common::ConfigError;
use cachebench_core::config::{BenchmarkConfig, LatencyConfig, PolicyConfig, PolicyKind};
use cachebench_core::latency::InferenceBackend;
use cachebench_core::Trace;
use cachebench_core::sim::{Benchmark, Comparison, PolicyOutcome, run_all};
use cachebench_core::stats::BenchmarkResult;
use cachebench_core::trace::synth;
use cachebench_core::trace::loader::from_prompts;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::mocks::{FailingBackend, FixedBackend, FlakyBackend};
use crate::common::traces::keys;

fn policies(kinds: &[PolicyKind]) -> Vec<PolicyConfig> {
    kinds.iter().cloned().map(PolicyConfig::from).collect()
}

/// Simulated comparison at capacity 2.
fn simulated(trace: &Trace, kinds: &[PolicyKind]) -> Comparison {
    run_all(trace, 2, &policies(kinds), &LatencyConfig::simulation(), None).unwrap()
}

fn completed<'a>(outcome: Option<&'a PolicyOutcome>) -> &'a BenchmarkResult {
    outcome.and_then(PolicyOutcome::result).expect("completed run")
}

#[test]
fn lru_thrashes_on_a_cyclic_scan() {
    let trace = keys(&["k1", "k2", "k3", "k1"]);
    let table = simulated(&trace, &[PolicyKind::Lru]);
    let lru = completed(table.get("lru"));
    assert_eq!(lru.hits, 0);
    assert!(lru.hit_rate.abs() < f64::EPSILON);
}

#[test]
fn slru_protects_a_reused_key() {
    let trace = keys(&["k1", "k1", "k2", "k3", "k1"]);
    let table = simulated(&trace, &[PolicyKind::slru()]);
    let slru = completed(table.get("slru"));
    assert!((slru.hit_rate - 0.4).abs() < 1e-9);
    assert_eq!(slru.counters.promotions, 1);
}

#[rstest]
#[case(PolicyKind::NoCache)]
#[case(PolicyKind::Lru)]
#[case(PolicyKind::slru())]
fn zero_capacity_fails_before_replay(#[case] kind: PolicyKind) {
    let trace = keys(&["a"]);
    let backend = Arc::new(FixedBackend::new(10));
    let shared: Arc<dyn InferenceBackend> = Arc::clone(&backend) as Arc<dyn InferenceBackend>;
    let err = run_all(
        &trace,
        0,
        &policies(&[kind]),
        &LatencyConfig::real_backend(),
        Some(shared),
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::InvalidCapacity(0));
    assert_eq!(backend.calls(), 0);
}

#[test]
fn failing_backend_marks_only_that_run_failed() {
    let trace = keys(&["a", "b"]);
    let config = BenchmarkConfig {
        capacity: 2,
        policies: policies(&[PolicyKind::NoCache, PolicyKind::Lru]),
        latency: LatencyConfig::real_backend(),
        ..BenchmarkConfig::default()
    };
    let backend: Arc<dyn InferenceBackend> = Arc::new(FailingBackend);
    let table = Benchmark::new(config, Some(backend)).unwrap().run_all(&trace);
    assert_eq!(table.len(), 2);
    assert!(table.all_failed());
    let failed: Vec<&str> = table.failed().map(|(name, _)| name).collect();
    assert_eq!(failed, vec!["no_cache", "lru"]);
    assert!(table.failed().all(|(_, reason)| reason.contains("connection refused")));
}

#[test]
fn backend_failure_in_one_run_leaves_the_others_intact() {
    // lru makes one backend call, no_cache then fails on its third
    let trace = keys(&["a", "a", "a"]);
    let config = BenchmarkConfig {
        capacity: 1,
        policies: policies(&[PolicyKind::Lru, PolicyKind::NoCache]),
        latency: LatencyConfig::real_backend(),
        ..BenchmarkConfig::default()
    };
    let backend: Arc<dyn InferenceBackend> = Arc::new(FlakyBackend::new(3, 20));
    let table = Benchmark::new(config, Some(backend)).unwrap().run_all(&trace);

    let lru = completed(table.get("lru"));
    assert_eq!(lru.hits, 2);
    assert!(table.get("no_cache").is_some_and(PolicyOutcome::is_failed));
    assert!(!table.all_failed());
    assert_eq!(table.completed().count(), 1);
}

#[test]
fn real_backend_latency_is_charged_only_on_misses() {
    let trace = keys(&["a", "a", "a"]);
    let config = BenchmarkConfig {
        capacity: 1,
        policies: policies(&[PolicyKind::NoCache, PolicyKind::Lru]),
        latency: LatencyConfig::real_backend(),
        ..BenchmarkConfig::default()
    };
    let backend = Arc::new(FixedBackend::new(40));
    let shared: Arc<dyn InferenceBackend> = Arc::clone(&backend) as Arc<dyn InferenceBackend>;
    let table = Benchmark::new(config, Some(shared)).unwrap().run_all(&trace);

    let lru = completed(table.get("lru"));
    assert!((lru.mean_latency - (40.0 + 5.0 + 5.0) / 3.0).abs() < 1e-6);
    let no_cache = completed(table.get("no_cache"));
    assert!((no_cache.mean_latency - 40.0).abs() < 1e-6);
    assert_eq!(backend.calls(), 4);
}

#[test]
fn real_backend_without_backend_is_rejected() {
    let config = BenchmarkConfig {
        latency: LatencyConfig::real_backend(),
        ..BenchmarkConfig::default()
    };
    assert_eq!(Benchmark::new(config, None).unwrap_err(), ConfigError::MissingBackend);
}

#[test]
fn no_cache_is_the_floor() {
    let prompts: Vec<String> = (0..20).map(|i| format!("prompt {i}")).collect();
    let stream = synth::with_repeats(&prompts, 10, 5, 50, 11).unwrap();
    let trace = from_prompts(&stream).trace;
    let table = Benchmark::new(BenchmarkConfig { capacity: 5, ..BenchmarkConfig::default() }, None)
        .unwrap()
        .run_all(&trace);

    let no_cache = completed(table.get("no_cache"));
    assert!(no_cache.hit_rate.abs() < f64::EPSILON);
    for result in table.completed() {
        assert!(result.hit_rate >= no_cache.hit_rate);
        assert!(result.mean_latency <= no_cache.mean_latency + 1e-9);
        assert_eq!(result.requests, 50);
    }
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let trace = from_prompts(synth::fallback(200)).trace;
    let sequential = BenchmarkConfig {
        capacity: 4,
        latency: LatencyConfig::mocked(5),
        ..BenchmarkConfig::default()
    };
    let parallel = BenchmarkConfig {
        parallel: true,
        ..sequential.clone()
    };
    let a = Benchmark::new(sequential, None).unwrap().run_all(&trace);
    let b = Benchmark::new(parallel, None).unwrap().run_all(&trace);

    let names: Vec<&str> = b.iter().map(|e| e.policy_name.as_str()).collect();
    assert_eq!(names, vec!["no_cache", "lru", "slru"]);
    for (x, y) in a.completed().zip(b.completed()) {
        assert_eq!(x.policy_name, y.policy_name);
        assert_eq!(x.hits, y.hits);
        assert!((x.mean_latency - y.mean_latency).abs() < f64::EPSILON);
        assert!((x.p95_latency - y.p95_latency).abs() < f64::EPSILON);
    }
}

#[test]
fn cancelled_benchmark_reports_every_run_failed() {
    let trace = keys(&["a", "b"]);
    let config = BenchmarkConfig {
        capacity: 2,
        ..BenchmarkConfig::default()
    };
    let benchmark = Benchmark::new(config, None).unwrap();
    benchmark.cancel_token().cancel();
    let table = benchmark.run_all(&trace);
    assert!(table.all_failed());
    assert!(table.completed().next().is_none());
}

#[test]
fn skipped_events_are_reported_per_run() {
    let trace = Trace::new(vec![
        cachebench_core::trace::TraceEvent::new(0, "a", 1.0),
        cachebench_core::trace::TraceEvent::new(1, "", 1.0),
    ])
    .unwrap();
    let table = simulated(&trace, &[PolicyKind::Lru]);
    let lru = completed(table.get("lru"));
    assert_eq!(lru.skipped, 1);
    assert_eq!(lru.requests, 1);
}

#[test]
fn comparison_serializes_as_an_ordered_list() {
    let trace = keys(&["a", "a"]);
    let table = simulated(&trace, &[PolicyKind::Lru]);
    let value = serde_json::to_value(&table).unwrap();
    assert_eq!(value[0]["policy_name"], "lru");
    assert_eq!(value[0]["status"], "completed");
    assert_eq!(value[0]["detail"]["hits"], 1);
}
