//! # Cache Key and Error Tests

use cachebench_core::common::key::{canonicalize, estimate_cost};
use cachebench_core::common::{BackendError, CacheKey, ConfigError, InvalidKeyError, RunError};
use rstest::rstest;

#[rstest]
#[case("hello   world", "hello world")]
#[case("\u{2018}quoted\u{2019}", "'quoted'")]
#[case("a\u{2013}b", "a-b")]
#[case("\n\ttrim me  ", "trim me")]
fn canonical_form(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(canonicalize(raw), expected);
}

#[test]
fn prompts_differing_only_in_whitespace_share_a_key() {
    let a = CacheKey::from_prompt("What is  BLE?").unwrap();
    let b = CacheKey::from_prompt(" What is BLE? ").unwrap();
    assert_eq!(a.as_str(), b.as_str());
    assert!((a.cost() - estimate_cost(a.as_str())).abs() < f64::EPSILON);
}

#[test]
fn explicit_cost_is_kept() {
    let key = CacheKey::with_cost("abc", 12.5).unwrap();
    let (text, cost) = key.into_parts();
    assert_eq!(text, "abc");
    assert!((cost - 12.5).abs() < f64::EPSILON);
}

#[test]
fn error_messages_name_the_problem() {
    assert_eq!(
        InvalidKeyError { sequence_index: 7 }.to_string(),
        "invalid cache key at sequence index 7: key is empty"
    );
    assert_eq!(
        RunError::from(BackendError::Status(503)).to_string(),
        "backend returned status 503"
    );
    assert_eq!(
        RunError::from(ConfigError::EmptyPolicyList).to_string(),
        "no policies configured"
    );
    assert_eq!(
        RunError::Cancelled(3).to_string(),
        "run cancelled before sequence index 3"
    );
}
