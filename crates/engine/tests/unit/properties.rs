//! Invariant properties over randomized traces.
//!
//! Every property runs under each technique: residency uniqueness per
//! level, exclusivity across the L1/victim pair, the accounting identity at
//! the level driven by the trace, and write-back conservation once evictions
//! force full propagation.

use std::collections::HashMap;

use proptest::prelude::*;

use csim_core::cache::Cache;
use csim_core::config::{CachePolicy, HierarchyConfig, Technique};
use csim_core::hierarchy::CacheHierarchy;
use csim_core::mem::MemoryManager;
use csim_core::trace::AccessOp;

/// A deliberately tiny hierarchy so short traces still cause evictions.
fn small_config() -> HierarchyConfig {
    HierarchyConfig {
        l1: CachePolicy::new(256, 64, 2, 1, 8),
        l2: CachePolicy::new(1024, 64, 2, 8, 20),
        l3: CachePolicy::new(4096, 64, 4, 20, 100),
        victim: CachePolicy::new(128, 64, 2, 1, 8),
    }
}

fn technique(index: usize) -> Technique {
    [
        Technique::None,
        Technique::Prefetch,
        Technique::Fifo,
        Technique::Victim,
    ][index]
}

fn assert_unique(lines: &[u32]) {
    let mut sorted = lines.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), lines.len(), "duplicate resident line");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn l1_accounting_identity_holds(
        ops in proptest::collection::vec((any::<bool>(), 0u32..0x4000), 1..200),
        tech_index in 0usize..4,
    ) {
        let mut hierarchy =
            CacheHierarchy::new(&small_config(), technique(tech_index)).unwrap();
        for &(is_write, addr) in &ops {
            let op = if is_write { AccessOp::Write } else { AccessOp::Read };
            hierarchy.access(op, addr);
        }

        let stats = hierarchy.l1().stats();
        prop_assert_eq!(stats.num_read + stats.num_write, ops.len() as u64);
        prop_assert_eq!(stats.num_hit + stats.num_miss, stats.num_read + stats.num_write);
    }

    #[test]
    fn residency_is_unique_per_level_and_exclusive_with_the_buffer(
        ops in proptest::collection::vec((any::<bool>(), 0u32..0x4000), 1..200),
        tech_index in 0usize..4,
    ) {
        let mut hierarchy =
            CacheHierarchy::new(&small_config(), technique(tech_index)).unwrap();
        for &(is_write, addr) in &ops {
            let op = if is_write { AccessOp::Write } else { AccessOp::Read };
            hierarchy.access(op, addr);
        }

        let l1_lines = hierarchy.l1().resident_lines();
        assert_unique(&l1_lines);
        let mut level = hierarchy.l1().lower();
        while let Some(cache) = level {
            assert_unique(&cache.resident_lines());
            level = cache.lower();
        }

        if let Some(buffer) = hierarchy.victim() {
            let buffer_lines = buffer.resident_lines();
            assert_unique(&buffer_lines);
            for line in buffer_lines {
                prop_assert!(
                    !l1_lines.contains(&line),
                    "line {line:#x} resident in both L1 and the buffer"
                );
            }
        }
    }

    #[test]
    fn evicted_writes_reach_the_backing_store(
        writes in proptest::collection::vec((0u32..1024, any::<u8>()), 1..50),
        tech_index in 0usize..4,
    ) {
        let config = small_config();
        let tech = technique(tech_index);
        let mut l1_policy = config.l1.clone();
        if tech == Technique::Fifo {
            l1_policy.make_fully_associative();
        }

        let l3 = Cache::new(config.l3, Technique::None, None).unwrap();
        let l2 = Cache::new(config.l2, Technique::None, Some(Box::new(l3))).unwrap();
        let mut l1 = Cache::new(l1_policy, tech, Some(Box::new(l2))).unwrap();
        let mut buffer = match tech {
            Technique::Victim => Some(Cache::new(config.victim, tech, None).unwrap()),
            _ => None,
        };
        let mut memory = MemoryManager::new();

        let mut expected: HashMap<u32, u8> = HashMap::new();
        for &(addr, val) in &writes {
            l1.write(addr, val, &mut memory, buffer.as_mut());
            let _ = expected.insert(addr, val);
        }

        // Two sweeps over disjoint far regions evict every level clean.
        for base in [0x0010_0000u32, 0x0020_0000] {
            for line in 0..256u32 {
                l1.read(base + line * 64, &mut memory, buffer.as_mut());
            }
        }

        for (&addr, &val) in &expected {
            prop_assert_eq!(
                memory.get_byte_uncached(addr),
                val,
                "byte {:#x} never propagated",
                addr
            );
        }
    }
}
