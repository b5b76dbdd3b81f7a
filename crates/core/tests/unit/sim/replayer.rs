//! # Replayer Tests

use cachebench_core::common::{Outcome, RunError};
use cachebench_core::config::{LatencyConfig, PolicyKind};
use cachebench_core::latency::LatencyModel;
use cachebench_core::policy::CachePolicy;
use cachebench_core::sim::{CancelToken, Replayer};
use cachebench_core::trace::{Trace, TraceEvent};
use pretty_assertions::assert_eq;

use crate::common::traces::{keys, policy};

fn simulation() -> LatencyModel {
    LatencyModel::new(&LatencyConfig::simulation(), None).unwrap()
}

#[test]
fn records_follow_trace_order() {
    let trace = keys(&["a", "b", "a"]);
    let output = Replayer::new("lru", &trace, policy(&PolicyKind::Lru, 4), simulation())
        .run()
        .unwrap();
    let indexes: Vec<u64> = output.records.iter().map(|r| r.sequence_index).collect();
    let outcomes: Vec<Outcome> = output.records.iter().map(|r| r.outcome).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
    assert_eq!(outcomes, vec![Outcome::Miss, Outcome::Miss, Outcome::Hit]);
    assert!(output.records.iter().all(|r| &*r.policy_name == "lru"));
    assert_eq!(output.final_occupancy, 2);
    assert_eq!(output.counters.hits, 1);
}

#[test]
fn invalid_keys_are_skipped_and_counted() {
    let trace = Trace::new(vec![
        TraceEvent::new(0, "a", 1.0),
        TraceEvent::new(1, "", 1.0),
        TraceEvent::new(2, "a", 1.0),
    ])
    .unwrap();
    let output = Replayer::new("lru", &trace, policy(&PolicyKind::Lru, 2), simulation())
        .run()
        .unwrap();
    assert_eq!(output.skipped, 1);
    let indexes: Vec<u64> = output.records.iter().map(|r| r.sequence_index).collect();
    assert_eq!(indexes, vec![0, 2]);
    assert_eq!(output.records[1].outcome, Outcome::Hit);
}

#[test]
fn mocked_replays_are_reproducible() {
    let trace = keys(&["a", "b", "a", "c", "a", "b"]);
    let run = || {
        let latency = LatencyModel::new(&LatencyConfig::mocked(3), None).unwrap();
        Replayer::new("slru", &trace, policy(&PolicyKind::slru(), 2), latency)
            .run()
            .unwrap()
            .records
    };
    assert_eq!(run(), run());
}

#[test]
fn record_stream_is_lazy() {
    let trace = keys(&["a", "a", "b"]);
    let mut replay =
        Replayer::new("lru", &trace, policy(&PolicyKind::Lru, 2), simulation()).records();
    let first = replay.next().unwrap().unwrap();
    assert_eq!(first.outcome, Outcome::Miss);
    assert_eq!(replay.policy().occupancy(), 1);
    assert_eq!(replay.by_ref().count(), 2);
    assert!(replay.next().is_none());
}

#[test]
fn cancellation_stops_before_the_next_event() {
    let trace = keys(&["a", "b", "c"]);
    let token = CancelToken::new();
    let mut replay = Replayer::new("lru", &trace, policy(&PolicyKind::Lru, 2), simulation())
        .with_cancel(token.clone())
        .records();
    assert!(replay.next().unwrap().is_ok());
    token.cancel();
    assert_eq!(replay.next().unwrap().unwrap_err(), RunError::Cancelled(1));
    assert!(replay.next().is_none());
}

#[test]
fn cancelled_run_returns_no_records() {
    let trace = keys(&["a"]);
    let token = CancelToken::new();
    token.cancel();
    let result = Replayer::new("lru", &trace, policy(&PolicyKind::Lru, 2), simulation())
        .with_cancel(token)
        .run();
    assert_eq!(result.unwrap_err(), RunError::Cancelled(0));
}

#[test]
fn empty_trace_replays_to_nothing() {
    let trace = Trace::default();
    let output = Replayer::new("no_cache", &trace, policy(&PolicyKind::NoCache, 1), simulation())
        .run()
        .unwrap();
    assert!(output.records.is_empty());
    assert_eq!(output.skipped, 0);
}
