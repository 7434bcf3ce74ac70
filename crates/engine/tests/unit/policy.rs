//! Cache-policy validation and configuration loading.

use csim_core::config::{CachePolicy, HierarchyConfig};
use csim_core::error::{PolicyError, SimError};

// ══════════════════════════════════════════════════════════
// 1. Geometry invariants
// ══════════════════════════════════════════════════════════

#[test]
fn a_valid_policy_normalizes() {
    let mut policy = CachePolicy::new(32 * 1024, 64, 8, 1, 8);
    assert!(policy.normalize().is_ok());
    assert_eq!(policy.block_num, 512);
    assert_eq!(policy.num_sets(), 64);
}

#[test]
fn block_count_is_derived_when_omitted() {
    let mut policy = CachePolicy {
        cache_size: 1024,
        block_size: 64,
        block_num: 0,
        associativity: 4,
        hit_latency: 1,
        miss_latency: 8,
    };
    policy.normalize().unwrap();
    assert_eq!(policy.block_num, 16);
}

#[test]
fn cache_size_must_be_a_power_of_two() {
    let mut policy = CachePolicy::new(3000, 64, 1, 1, 8);
    assert_eq!(
        policy.normalize(),
        Err(PolicyError::CacheSizeNotPowerOfTwo(3000))
    );
}

#[test]
fn block_size_must_be_a_power_of_two() {
    let mut policy = CachePolicy::new(1024, 48, 1, 1, 8);
    assert_eq!(
        policy.normalize(),
        Err(PolicyError::BlockSizeNotPowerOfTwo(48))
    );
}

#[test]
fn blocks_must_fit_the_cache() {
    let mut policy = CachePolicy::new(8, 16, 1, 1, 8);
    assert_eq!(
        policy.normalize(),
        Err(PolicyError::SizeNotBlockMultiple {
            cache_size: 8,
            block_size: 16,
        })
    );
}

#[test]
fn a_stated_block_count_must_agree() {
    let policy = CachePolicy {
        cache_size: 64,
        block_size: 16,
        block_num: 2,
        associativity: 2,
        hit_latency: 1,
        miss_latency: 8,
    };
    assert_eq!(
        policy.validate(),
        Err(PolicyError::BlockCountMismatch {
            block_num: 2,
            block_size: 16,
            cache_size: 64,
        })
    );
}

#[test]
fn sets_must_divide_evenly() {
    let mut policy = CachePolicy::new(64, 16, 3, 1, 8);
    assert_eq!(
        policy.normalize(),
        Err(PolicyError::AssociativityMismatch {
            block_num: 4,
            associativity: 3,
        })
    );
}

#[test]
fn zero_associativity_is_rejected() {
    let mut policy = CachePolicy::new(64, 16, 0, 1, 8);
    assert!(matches!(
        policy.normalize(),
        Err(PolicyError::AssociativityMismatch { .. })
    ));
}

#[test]
fn fully_associative_collapses_to_one_set() {
    let mut policy = CachePolicy::new(8 * 1024, 64, 8, 1, 8);
    policy.make_fully_associative();
    policy.normalize().unwrap();
    assert_eq!(policy.associativity, 128);
    assert_eq!(policy.num_sets(), 1);
}

// ══════════════════════════════════════════════════════════
// 2. JSON configuration
// ══════════════════════════════════════════════════════════

#[test]
fn an_empty_override_keeps_the_reference_hierarchy() {
    let config = HierarchyConfig::from_json_str("{}").unwrap();
    assert_eq!(config, HierarchyConfig::default());
    assert_eq!(config.l1.cache_size, 32 * 1024);
    assert_eq!(config.l2.cache_size, 256 * 1024);
    assert_eq!(config.l3.cache_size, 8 * 1024 * 1024);
    assert_eq!(config.victim.associativity, 128);
}

#[test]
fn a_partial_override_keeps_the_other_fields() {
    let config =
        HierarchyConfig::from_json_str(r#"{"l1": {"cache_size": 1024, "associativity": 2}}"#)
            .unwrap();
    assert_eq!(config.l1.cache_size, 1024);
    assert_eq!(config.l1.associativity, 2);
    assert_eq!(config.l1.block_size, 64);
    assert_eq!(config.l2, HierarchyConfig::default().l2);
}

#[test]
fn malformed_json_is_a_config_error() {
    let err = HierarchyConfig::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, SimError::Config(_)));
}
