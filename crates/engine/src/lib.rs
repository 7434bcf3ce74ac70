//! Trace-driven multi-level cache hierarchy simulator.
//!
//! This crate implements the cache engine behind the `csim` binaries:
//! 1. **Cache level:** set-associative lookup, LRU/FIFO replacement,
//!    write-allocate + write-back stores, and recursive fills from the next
//!    level down.
//! 2. **Techniques:** stride-based hardware prefetching, FIFO replacement on
//!    a fully-associative L1, and a fully-associative victim buffer.
//! 3. **Hierarchy:** assembly of L1 -> L2 -> L3 over a demand-paged backing
//!    store, plus the single-level unified and split-I/D variants.
//! 4. **Trace and report:** parsers for both trace dialects and CSV writers
//!    for both report dialects.
//!
//! The simulator is strictly sequential: each access fully resolves,
//! including recursive fills, write-backs, prefetches, and victim swaps,
//! before the next begins.

/// Cache level: blocks, lookup, replacement, fills, and write-back.
pub mod cache;
/// Simulator configuration (defaults, technique selection, policy validation).
pub mod config;
/// Error types for configuration, trace input, and I/O failures.
pub mod error;
/// Hierarchy assembly and the trace-facing access dispatch.
pub mod hierarchy;
/// Demand-paged sparse backing store at the bottom of the hierarchy.
pub mod mem;
/// CSV report writers for both simulator variants.
pub mod report;
/// Per-level access statistics.
pub mod stats;
/// Trace-file parsing for both input dialects.
pub mod trace;

/// One simulated cache level; chain them via the `lower` link.
pub use crate::cache::Cache;
/// Static cache-level parameters and the hierarchy-wide configuration.
pub use crate::config::{CachePolicy, HierarchyConfig, Technique};
/// Construction-time and run-time error types.
pub use crate::error::{PolicyError, SimError};
/// The three trace-facing assemblies (multi-level, unified, split I/D).
pub use crate::hierarchy::{CacheHierarchy, SplitCache, UnifiedCache};
/// Sparse byte-addressable memory with page-presence queries.
pub use crate::mem::MemoryManager;
/// Monotone per-level counters and derived miss rate.
pub use crate::stats::CacheStats;
