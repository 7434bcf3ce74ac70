//! Hierarchy assembly and the trace-facing dispatch.

use csim_core::config::{CachePolicy, HierarchyConfig, Technique};
use csim_core::hierarchy::{CacheHierarchy, SplitCache, UnifiedCache};
use csim_core::trace::{AccessKind, AccessOp};

fn small_policy() -> CachePolicy {
    CachePolicy::new(8 * 1024, 64, 1, 1, 100)
}

// ══════════════════════════════════════════════════════════
// 1. Assembly per technique
// ══════════════════════════════════════════════════════════

#[test]
fn baseline_reports_three_levels() {
    let hierarchy = CacheHierarchy::new(&HierarchyConfig::default(), Technique::None).unwrap();
    let names: Vec<&str> = hierarchy.levels().iter().map(|(name, _)| *name).collect();
    assert_eq!(names, ["L1", "L2", "L3"]);
    assert!(hierarchy.victim().is_none());
}

#[test]
fn victim_technique_adds_the_buffer_row() {
    let hierarchy = CacheHierarchy::new(&HierarchyConfig::default(), Technique::Victim).unwrap();
    let names: Vec<&str> = hierarchy.levels().iter().map(|(name, _)| *name).collect();
    assert_eq!(names, ["L1", "victim", "L2", "L3"]);

    let buffer = hierarchy.victim().unwrap();
    assert_eq!(buffer.policy().num_sets(), 1);
}

#[test]
fn fifo_technique_rebuilds_l1_fully_associative() {
    let hierarchy = CacheHierarchy::new(&HierarchyConfig::default(), Technique::Fifo).unwrap();
    let policy = hierarchy.l1().policy();
    assert_eq!(policy.associativity, policy.block_num);
    assert_eq!(policy.num_sets(), 1);
}

#[test]
fn invalid_geometry_builds_nothing() {
    let mut config = HierarchyConfig::default();
    config.l2.cache_size = 3000;
    assert!(CacheHierarchy::new(&config, Technique::None).is_err());
}

// ══════════════════════════════════════════════════════════
// 2. Access dispatch
// ══════════════════════════════════════════════════════════

#[test]
fn an_access_materializes_its_page_and_recurses_down() {
    let mut hierarchy = CacheHierarchy::new(&HierarchyConfig::default(), Technique::None).unwrap();
    hierarchy.access(AccessOp::Read, 0x1234);

    assert!(hierarchy.memory().has_page(0x1234));
    let l1 = hierarchy.l1().stats();
    assert_eq!((l1.num_read, l1.num_miss), (1, 1));
    // The cold fill missed at every level.
    for (_, stats) in hierarchy.levels() {
        assert_eq!(stats.num_miss, 1);
    }
}

#[test]
fn conflict_misses_swap_through_the_victim_buffer() {
    let mut hierarchy = CacheHierarchy::new(&HierarchyConfig::default(), Technique::Victim).unwrap();

    // Default L1 is 8-way with 64 sets: lines 4096 apart share set 0.
    // Nine distinct lines overflow the set; the tenth access finds the
    // displaced line in the buffer.
    for i in 0..9 {
        hierarchy.access(AccessOp::Read, i * 4096);
    }
    assert!(hierarchy.victim().unwrap().contains(0));

    hierarchy.access(AccessOp::Read, 0);
    let stats = hierarchy.l1().stats();
    assert_eq!(stats.num_read, 10);
    assert_eq!(stats.num_miss, 9);
    assert_eq!(stats.num_hit, 1);
    assert!(!hierarchy.victim().unwrap().contains(0));
}

// ══════════════════════════════════════════════════════════
// 3. Single-level variants
// ══════════════════════════════════════════════════════════

#[test]
fn unified_cache_serves_reads_and_writes() {
    let mut unified = UnifiedCache::new(small_policy()).unwrap();
    unified.access(AccessOp::Write, 0x40);
    unified.access(AccessOp::Read, 0x40);

    let stats = unified.cache().stats();
    assert_eq!((stats.num_read, stats.num_write), (1, 1));
    assert_eq!((stats.num_hit, stats.num_miss), (1, 1));
}

#[test]
fn split_routes_by_access_kind() {
    let mut split = SplitCache::new(small_policy(), small_policy()).unwrap();
    split.access(AccessOp::Read, 0x100, AccessKind::Instruction);
    split.access(AccessOp::Write, 0x200, AccessKind::Data);

    assert_eq!(split.icache().stats().num_read, 1);
    assert_eq!(split.icache().stats().num_write, 0);
    assert_eq!(split.dcache().stats().num_read, 0);
    assert_eq!(split.dcache().stats().num_write, 1);
}

#[test]
fn instruction_writes_are_dropped_entirely() {
    let mut split = SplitCache::new(small_policy(), small_policy()).unwrap();
    split.access(AccessOp::Write, 0x100, AccessKind::Instruction);

    let stats = split.icache().stats();
    assert_eq!(stats.accesses(), 0);
    assert_eq!(stats.num_write, 0);
    assert_eq!(stats.total_cycles, 0);
    assert!(!split.icache().contains(0x100));
}
