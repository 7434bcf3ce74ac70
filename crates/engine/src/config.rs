//! Configuration for the cache hierarchy simulator.
//!
//! This module defines the structures that parameterize a simulation run:
//! 1. **Defaults:** the reference cache hierarchy (L1/L2/L3 plus the victim
//!    buffer) as named constants.
//! 2. **Policy:** the static geometry and latency of one cache level, with
//!    validation of every invariant the engine relies on.
//! 3. **Technique:** the optional L1 enhancement selected for a run.
//!
//! Configuration deserializes from JSON; every omitted field falls back to
//! its default, so a partial override file only names what it changes.

use serde::Deserialize;

use crate::error::{PolicyError, SimError};

/// Default configuration constants for the reference hierarchy.
mod defaults {
    /// Cache line size shared by every level (64 bytes).
    pub const BLOCK_SIZE: u32 = 64;

    /// Set associativity shared by the main levels (8 ways).
    pub const ASSOCIATIVITY: u32 = 8;

    /// L1 capacity (32 KiB).
    pub const L1_SIZE: u32 = 32 * 1024;

    /// L1 hit latency in cycles.
    pub const L1_HIT_LATENCY: u64 = 1;

    /// L1 miss latency in cycles.
    pub const L1_MISS_LATENCY: u64 = 8;

    /// L2 capacity (256 KiB).
    pub const L2_SIZE: u32 = 256 * 1024;

    /// L2 hit latency in cycles.
    pub const L2_HIT_LATENCY: u64 = 8;

    /// L2 miss latency in cycles.
    pub const L2_MISS_LATENCY: u64 = 20;

    /// L3 capacity (8 MiB).
    pub const L3_SIZE: u32 = 8 * 1024 * 1024;

    /// L3 hit latency in cycles.
    pub const L3_HIT_LATENCY: u64 = 20;

    /// L3 miss latency in cycles; also the cost of reaching main memory.
    pub const L3_MISS_LATENCY: u64 = 100;

    /// Victim buffer capacity (8 KiB, fully associative).
    pub const VICTIM_SIZE: u32 = 8 * 1024;

    /// Victim buffer hit latency in cycles.
    pub const VICTIM_HIT_LATENCY: u64 = 1;

    /// Victim buffer miss latency in cycles.
    pub const VICTIM_MISS_LATENCY: u64 = 8;
}

/// Optional enhancement technique applied to the first cache level.
///
/// The techniques are mutually exclusive; the baseline hierarchy runs with
/// [`Technique::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Technique {
    /// Plain set-associative LRU caching.
    #[default]
    None,
    /// Stride-based hardware prefetching on L1.
    Prefetch,
    /// FIFO replacement with L1 rebuilt fully associative.
    Fifo,
    /// A fully-associative victim buffer attached to L1.
    Victim,
}

/// Static configuration of one cache level.
///
/// `block_num` may be left at 0 and is then derived as
/// `cache_size / block_size` during validation; a nonzero value must agree
/// with the other fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CachePolicy {
    /// Total capacity in bytes; must be a power of two.
    #[serde(default = "CachePolicy::default_cache_size")]
    pub cache_size: u32,

    /// Cache line size in bytes; must be a power of two.
    #[serde(default = "CachePolicy::default_block_size")]
    pub block_size: u32,

    /// Number of blocks (0 = derive from `cache_size / block_size`).
    #[serde(default)]
    pub block_num: u32,

    /// Ways per set; equals `block_num` for a fully-associative level.
    #[serde(default = "CachePolicy::default_associativity")]
    pub associativity: u32,

    /// Cycles charged for a hit at this level.
    #[serde(default = "CachePolicy::default_hit_latency")]
    pub hit_latency: u64,

    /// Cycles charged for a miss at this level.
    #[serde(default = "CachePolicy::default_miss_latency")]
    pub miss_latency: u64,
}

impl CachePolicy {
    /// Builds a policy with the block count derived from size and block size.
    pub fn new(
        cache_size: u32,
        block_size: u32,
        associativity: u32,
        hit_latency: u64,
        miss_latency: u64,
    ) -> Self {
        let block_num = if block_size == 0 {
            0
        } else {
            cache_size / block_size
        };
        Self {
            cache_size,
            block_size,
            block_num,
            associativity,
            hit_latency,
            miss_latency,
        }
    }

    /// Fills the derived block count, then checks every geometry invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated [`PolicyError`] invariant; the policy is
    /// unusable in that case.
    pub fn normalize(&mut self) -> Result<(), PolicyError> {
        if self.block_num == 0 && self.block_size != 0 {
            self.block_num = self.cache_size / self.block_size;
        }
        self.validate()
    }

    /// Checks every geometry invariant without mutating the policy.
    ///
    /// # Errors
    ///
    /// Returns the first violated [`PolicyError`] invariant.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if !self.cache_size.is_power_of_two() {
            return Err(PolicyError::CacheSizeNotPowerOfTwo(self.cache_size));
        }
        if !self.block_size.is_power_of_two() {
            return Err(PolicyError::BlockSizeNotPowerOfTwo(self.block_size));
        }
        if self.cache_size % self.block_size != 0 {
            return Err(PolicyError::SizeNotBlockMultiple {
                cache_size: self.cache_size,
                block_size: self.block_size,
            });
        }
        if u64::from(self.block_num) * u64::from(self.block_size) != u64::from(self.cache_size) {
            return Err(PolicyError::BlockCountMismatch {
                block_num: self.block_num,
                block_size: self.block_size,
                cache_size: self.cache_size,
            });
        }
        if self.associativity == 0 || self.block_num % self.associativity != 0 {
            return Err(PolicyError::AssociativityMismatch {
                block_num: self.block_num,
                associativity: self.associativity,
            });
        }
        Ok(())
    }

    /// Collapses the policy to a single fully-associative set.
    pub fn make_fully_associative(&mut self) {
        if self.block_num == 0 && self.block_size != 0 {
            self.block_num = self.cache_size / self.block_size;
        }
        self.associativity = self.block_num;
    }

    /// Number of sets (`block_num / associativity`); 1 for fully associative.
    pub fn num_sets(&self) -> u32 {
        self.block_num / self.associativity
    }

    /// Returns the default L1 cache size in bytes.
    fn default_cache_size() -> u32 {
        defaults::L1_SIZE
    }

    /// Returns the default cache line size in bytes.
    fn default_block_size() -> u32 {
        defaults::BLOCK_SIZE
    }

    /// Returns the default set associativity.
    fn default_associativity() -> u32 {
        defaults::ASSOCIATIVITY
    }

    /// Returns the default hit latency in cycles.
    fn default_hit_latency() -> u64 {
        defaults::L1_HIT_LATENCY
    }

    /// Returns the default miss latency in cycles.
    fn default_miss_latency() -> u64 {
        defaults::L1_MISS_LATENCY
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        HierarchyConfig::default_l1()
    }
}

/// Parameters for every level of the multi-level hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HierarchyConfig {
    /// First-level cache.
    #[serde(default = "HierarchyConfig::default_l1")]
    pub l1: CachePolicy,

    /// Second-level cache.
    #[serde(default = "HierarchyConfig::default_l2")]
    pub l2: CachePolicy,

    /// Third-level cache (bottom of the chain, backed by memory).
    #[serde(default = "HierarchyConfig::default_l3")]
    pub l3: CachePolicy,

    /// Victim buffer, only instantiated for [`Technique::Victim`].
    #[serde(default = "HierarchyConfig::default_victim")]
    pub victim: CachePolicy,
}

impl HierarchyConfig {
    /// Loads a configuration from a JSON string; omitted fields keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] when the JSON does not deserialize.
    pub fn from_json_str(text: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] when the file cannot be read and
    /// [`SimError::Config`] when it does not deserialize.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, SimError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Returns the reference L1 policy (32 KiB, 8-way, 1/8 cycles).
    fn default_l1() -> CachePolicy {
        CachePolicy::new(
            defaults::L1_SIZE,
            defaults::BLOCK_SIZE,
            defaults::ASSOCIATIVITY,
            defaults::L1_HIT_LATENCY,
            defaults::L1_MISS_LATENCY,
        )
    }

    /// Returns the reference L2 policy (256 KiB, 8-way, 8/20 cycles).
    fn default_l2() -> CachePolicy {
        CachePolicy::new(
            defaults::L2_SIZE,
            defaults::BLOCK_SIZE,
            defaults::ASSOCIATIVITY,
            defaults::L2_HIT_LATENCY,
            defaults::L2_MISS_LATENCY,
        )
    }

    /// Returns the reference L3 policy (8 MiB, 8-way, 20/100 cycles).
    fn default_l3() -> CachePolicy {
        CachePolicy::new(
            defaults::L3_SIZE,
            defaults::BLOCK_SIZE,
            defaults::ASSOCIATIVITY,
            defaults::L3_HIT_LATENCY,
            defaults::L3_MISS_LATENCY,
        )
    }

    /// Returns the reference victim-buffer policy (8 KiB, fully associative).
    fn default_victim() -> CachePolicy {
        CachePolicy::new(
            defaults::VICTIM_SIZE,
            defaults::BLOCK_SIZE,
            defaults::VICTIM_SIZE / defaults::BLOCK_SIZE,
            defaults::VICTIM_HIT_LATENCY,
            defaults::VICTIM_MISS_LATENCY,
        )
    }
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            l1: Self::default_l1(),
            l2: Self::default_l2(),
            l3: Self::default_l3(),
            victim: Self::default_victim(),
        }
    }
}
