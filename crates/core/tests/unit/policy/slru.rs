//! # SLRU Tests

use cachebench_core::common::ConfigError;
use cachebench_core::common::Outcome::{Hit, Miss};
use cachebench_core::policy::{CachePolicy, Segment, SegmentSplit, SlruCache};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::traces::outcomes;

#[test]
fn promoted_key_survives_one_time_churn() {
    let mut slru = SlruCache::new(2, 0.5).unwrap();
    let got = outcomes(&mut slru, &["k1", "k1", "k2", "k3", "k1"]);
    assert_eq!(got, vec![Miss, Hit, Miss, Miss, Hit]);
    assert_eq!(slru.segment_of("k1"), Some(Segment::Protected));
    assert_eq!(slru.segment_of("k3"), Some(Segment::Probationary));
    assert_eq!(slru.segment_of("k2"), None);
}

#[test]
fn lru_loses_the_same_key_under_the_same_churn() {
    let mut lru = cachebench_core::policy::LruCache::new(2).unwrap();
    let got = outcomes(&mut lru, &["k1", "k1", "k2", "k3", "k1"]);
    assert_eq!(got, vec![Miss, Hit, Miss, Miss, Miss]);
}

#[test]
fn new_keys_enter_probationary() {
    let mut slru = SlruCache::new(4, 0.5).unwrap();
    let _ = outcomes(&mut slru, &["a", "b"]);
    assert_eq!(slru.probationary_keys().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(slru.protected_keys().count(), 0);
}

#[test]
fn protected_overflow_demotes_to_probationary_mru() {
    // protected = 1, probationary = 2
    let mut slru = SlruCache::new(3, 0.4).unwrap();
    assert_eq!(slru.split(), SegmentSplit { protected: 1, probationary: 2 });

    let _ = outcomes(&mut slru, &["a", "a", "b", "b"]);
    assert_eq!(slru.protected_keys().collect::<Vec<_>>(), vec!["b"]);
    assert_eq!(slru.probationary_keys().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(slru.segment_of("a"), Some(Segment::Probationary));

    let counters = slru.counters();
    assert_eq!(counters.promotions, 2);
    assert_eq!(counters.demotions, 1);
    assert_eq!(counters.evictions, 0);
}

#[test]
fn demotion_into_full_probationary_evicts_its_tail() {
    // protected = 1, probationary = 1
    let mut slru = SlruCache::new(2, 0.5).unwrap();
    let _ = outcomes(&mut slru, &["a", "a", "b", "b"]);
    // b promoted, a demoted into probationary which was emptied by b's promotion
    assert_eq!(slru.protected_keys().collect::<Vec<_>>(), vec!["b"]);
    assert_eq!(slru.probationary_keys().collect::<Vec<_>>(), vec!["a"]);

    let _ = outcomes(&mut slru, &["c"]);
    assert!(!slru.contains("a"));
    assert_eq!(slru.counters().evictions, 1);
    assert_eq!(slru.occupancy(), 2);
}

#[test]
fn protected_hits_refresh_protected_recency() {
    let mut slru = SlruCache::new(4, 0.5).unwrap();
    let _ = outcomes(&mut slru, &["a", "a", "b", "b", "a"]);
    assert_eq!(slru.protected_keys().collect::<Vec<_>>(), vec!["a", "b"]);
    let counters = slru.counters();
    assert_eq!(counters.probationary_hits, 2);
    assert_eq!(counters.protected_hits, 1);
    assert_eq!(counters.hits, 3);
}

#[rstest]
#[case(2, 0.5, 1, 1)]
#[case(10, 0.8, 8, 2)]
#[case(10, 0.01, 1, 9)]
#[case(10, 0.99, 9, 1)]
#[case(5, 0.5, 3, 2)]
fn split_rounds_and_keeps_both_segments(
    #[case] capacity: usize,
    #[case] ratio: f64,
    #[case] protected: usize,
    #[case] probationary: usize,
) {
    let split = SegmentSplit::new(capacity, ratio).unwrap();
    assert_eq!(split, SegmentSplit { protected, probationary });
    assert_eq!(split.total(), capacity);
}

#[rstest]
#[case(10, 0.0)]
#[case(10, 1.0)]
#[case(10, -0.5)]
#[case(10, f64::NAN)]
#[case(1, 0.5)]
fn unusable_split_is_rejected(#[case] capacity: usize, #[case] ratio: f64) {
    assert!(matches!(
        SlruCache::new(capacity, ratio),
        Err(ConfigError::InvalidSegmentSplit { .. })
    ));
}

#[test]
fn zero_capacity_reports_capacity_first() {
    assert_eq!(
        SlruCache::new(0, 0.5).unwrap_err(),
        ConfigError::InvalidCapacity(0)
    );
}
