//! # Configuration Tests
//!
//! Defaults, JSON deserialization, labels, and fail-fast validation.

use cachebench_core::common::ConfigError;
use cachebench_core::config::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn test_config_default() {
    let config = BenchmarkConfig::default();
    assert_eq!(config.capacity, 100);
    assert!(!config.parallel);
    assert_eq!(config.latency, LatencyConfig::simulation());
    let labels: Vec<String> = config.policies.iter().map(PolicyConfig::label).collect();
    assert_eq!(labels, vec!["no_cache", "lru", "slru"]);
    assert_eq!(config.trace, TraceSource::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_json_takes_defaults() {
    assert_eq!(BenchmarkConfig::from_json("{}").unwrap(), BenchmarkConfig::default());
}

#[test]
fn test_full_json_config() {
    let json = r#"{
        "capacity": 8,
        "parallel": true,
        "policies": [
            {"type": "LRU"},
            {"type": "Slru", "protected_ratio": 0.75},
            {"type": "Slru", "protected_ratio": 0.25, "name": "slru-small"}
        ],
        "latency": {"mode": "Mocked", "seed": 7},
        "trace": {"path": "traces/prompts.json", "limit": 500}
    }"#;
    let config = BenchmarkConfig::from_json(json).unwrap();
    assert_eq!(config.capacity, 8);
    assert!(config.parallel);
    assert_eq!(config.policies[0].kind, PolicyKind::Lru);
    assert_eq!(config.policies[1].label(), "slru-0.75");
    assert_eq!(config.policies[2].label(), "slru-small");
    assert_eq!(config.latency, LatencyConfig::mocked(7));
    assert_eq!(config.trace.limit, Some(500));
    assert!(config.validate().is_ok());
}

#[test]
fn test_slru_ratio_defaults_to_half() {
    let config = BenchmarkConfig::from_json(r#"{"policies": [{"type": "slru"}]}"#).unwrap();
    assert_eq!(config.policies[0].kind, PolicyKind::slru());
}

#[test]
fn test_simulation_latency_fields_default_individually() {
    let latency: LatencyConfig =
        serde_json::from_str(r#"{"mode": "Simulation", "miss_base_ms": 10.0}"#).unwrap();
    assert_eq!(
        latency,
        LatencyConfig::Simulation {
            hit_ms: 5.0,
            miss_base_ms: 10.0,
            miss_ms_per_cost: 2.0,
        }
    );
    assert_eq!(latency.mode(), LatencyMode::Simulation);
}

#[test]
fn test_unknown_policy_type_is_rejected() {
    assert!(BenchmarkConfig::from_json(r#"{"policies": [{"type": "Arc"}]}"#).is_err());
}

#[rstest]
#[case::zero_capacity(
    BenchmarkConfig { capacity: 0, ..BenchmarkConfig::default() },
    ConfigError::InvalidCapacity(0)
)]
#[case::no_policies(
    BenchmarkConfig { policies: Vec::new(), ..BenchmarkConfig::default() },
    ConfigError::EmptyPolicyList
)]
#[case::duplicate_label(
    BenchmarkConfig {
        policies: vec![PolicyKind::Lru.into(), PolicyKind::Lru.into()],
        ..BenchmarkConfig::default()
    },
    ConfigError::DuplicatePolicy("lru".to_owned())
)]
#[case::slru_at_capacity_one(
    BenchmarkConfig { capacity: 1, ..BenchmarkConfig::default() },
    ConfigError::InvalidSegmentSplit { ratio: 0.5, capacity: 1 }
)]
#[case::negative_latency(
    BenchmarkConfig {
        latency: LatencyConfig::RealBackend { hit_ms: -1.0 },
        ..BenchmarkConfig::default()
    },
    ConfigError::InvalidLatency { name: "hit_ms", value: -1.0 }
)]
fn test_validation_rejects(#[case] config: BenchmarkConfig, #[case] expected: ConfigError) {
    assert_eq!(config.validate().unwrap_err(), expected);
}

#[test]
fn test_capacity_zero_is_reported_before_anything_else() {
    let config = BenchmarkConfig {
        capacity: 0,
        policies: Vec::new(),
        ..BenchmarkConfig::default()
    };
    assert_eq!(config.validate().unwrap_err(), ConfigError::InvalidCapacity(0));
}

#[rstest]
#[case(1.0)]
#[case(1.5)]
#[case(-0.1)]
fn test_mocked_spread_must_stay_below_one(#[case] miss_spread: f64) {
    let latency = LatencyConfig::Mocked {
        hit_ms: 5.0,
        hit_jitter_ms: 1.0,
        miss_mean_ms: 1000.0,
        miss_spread,
        seed: 42,
    };
    assert!(matches!(
        latency.validate(),
        Err(ConfigError::InvalidLatency { name: "miss_spread", .. })
    ));
}

#[test]
fn test_config_serializes_back_to_equal_value() {
    let config = BenchmarkConfig {
        latency: LatencyConfig::real_backend(),
        ..BenchmarkConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(BenchmarkConfig::from_json(&json).unwrap(), config);
}
