//! Hierarchy assembly and trace-facing access dispatch.
//!
//! Three assemblies cover the simulator's run modes:
//! 1. [`CacheHierarchy`] — the multi-level chain (L1 -> L2 -> L3) with an
//!    optional technique applied to L1.
//! 2. [`UnifiedCache`] — a single level over the backing store.
//! 3. [`SplitCache`] — an instruction/data pair sharing the backing store.
//!
//! Each assembly owns its caches and the backing store outright; per access,
//! L1 borrows the store (and the victim buffer, when one exists) mutably,
//! so no interior mutability or locking is involved anywhere.

use crate::cache::Cache;
use crate::config::{CachePolicy, HierarchyConfig, Technique};
use crate::error::PolicyError;
use crate::mem::MemoryManager;
use crate::stats::CacheStats;
use crate::trace::{AccessKind, AccessOp};

/// The multi-level cache chain driven by the trace.
pub struct CacheHierarchy {
    l1: Cache,
    victim: Option<Cache>,
    memory: MemoryManager,
}

impl CacheHierarchy {
    /// Assembles L1 -> L2 -> L3 over a fresh backing store.
    ///
    /// [`Technique::Fifo`] rebuilds L1 fully associative before validation;
    /// [`Technique::Victim`] additionally instantiates the victim buffer
    /// with no lower link, so its write-backs go straight to memory.
    ///
    /// # Errors
    ///
    /// Returns the first [`PolicyError`] of any level; nothing is built.
    pub fn new(config: &HierarchyConfig, technique: Technique) -> Result<Self, PolicyError> {
        let mut l1_policy = config.l1.clone();
        if technique == Technique::Fifo {
            l1_policy.make_fully_associative();
        }

        let l3 = Cache::new(config.l3.clone(), Technique::None, None)?;
        let l2 = Cache::new(config.l2.clone(), Technique::None, Some(Box::new(l3)))?;
        let l1 = Cache::new(l1_policy, technique, Some(Box::new(l2)))?;
        let victim = match technique {
            Technique::Victim => Some(Cache::new(
                config.victim.clone(),
                Technique::Victim,
                None,
            )?),
            _ => None,
        };

        Ok(Self {
            l1,
            victim,
            memory: MemoryManager::new(),
        })
    }

    /// Runs one trace access to completion, materializing its page first.
    ///
    /// The written value is irrelevant to the model; only placement and
    /// accounting are simulated, so writes store zero.
    pub fn access(&mut self, op: AccessOp, addr: u32) {
        if !self.memory.has_page(addr) {
            self.memory.add_page(addr);
        }
        match op {
            AccessOp::Read => {
                let _ = self.l1.read(addr, &mut self.memory, self.victim.as_mut());
            }
            AccessOp::Write => self.l1.write(addr, 0, &mut self.memory, self.victim.as_mut()),
        }
    }

    /// Statistics rows in report order: L1, victim (when present), L2, L3.
    pub fn levels(&self) -> Vec<(&'static str, &CacheStats)> {
        let mut rows = vec![("L1", self.l1.stats())];
        if let Some(buffer) = &self.victim {
            rows.push(("victim", buffer.stats()));
        }
        let mut next = self.l1.lower();
        for name in ["L2", "L3"] {
            let Some(cache) = next else { break };
            rows.push((name, cache.stats()));
            next = cache.lower();
        }
        rows
    }

    /// Prints an aligned per-level statistics dump.
    pub fn print_statistics(&self) {
        println!("==========================================================");
        println!("CACHE HIERARCHY STATISTICS");
        println!("==========================================================");
        for (name, stats) in self.levels() {
            stats.print_row(name);
        }
        println!("==========================================================");
    }

    /// The first-level cache.
    pub fn l1(&self) -> &Cache {
        &self.l1
    }

    /// The victim buffer, present only under [`Technique::Victim`].
    pub fn victim(&self) -> Option<&Cache> {
        self.victim.as_ref()
    }

    /// The backing store.
    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }
}

/// A single cache level over the backing store (single-level unified run).
pub struct UnifiedCache {
    cache: Cache,
    memory: MemoryManager,
}

impl UnifiedCache {
    /// Builds the single level over a fresh backing store.
    ///
    /// # Errors
    ///
    /// Returns the violated [`PolicyError`] invariant.
    pub fn new(policy: CachePolicy) -> Result<Self, PolicyError> {
        Ok(Self {
            cache: Cache::new(policy, Technique::None, None)?,
            memory: MemoryManager::new(),
        })
    }

    /// Runs one access to completion.
    pub fn access(&mut self, op: AccessOp, addr: u32) {
        if !self.memory.has_page(addr) {
            self.memory.add_page(addr);
        }
        match op {
            AccessOp::Read => {
                let _ = self.cache.read(addr, &mut self.memory, None);
            }
            AccessOp::Write => self.cache.write(addr, 0, &mut self.memory, None),
        }
    }

    /// The simulated cache.
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// The backing store.
    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }
}

/// An instruction/data cache pair over one backing store (split variant).
///
/// Instruction writes are dropped outright: no statistics and no cycle cost,
/// the defining specialization of the instruction cache.
pub struct SplitCache {
    icache: Cache,
    dcache: Cache,
    memory: MemoryManager,
}

impl SplitCache {
    /// Builds the pair over a fresh backing store.
    ///
    /// # Errors
    ///
    /// Returns the first violated [`PolicyError`] invariant.
    pub fn new(i_policy: CachePolicy, d_policy: CachePolicy) -> Result<Self, PolicyError> {
        Ok(Self {
            icache: Cache::new(i_policy, Technique::None, None)?,
            dcache: Cache::new(d_policy, Technique::None, None)?,
            memory: MemoryManager::new(),
        })
    }

    /// Routes one access to the cache selected by its type tag.
    pub fn access(&mut self, op: AccessOp, addr: u32, kind: AccessKind) {
        if !self.memory.has_page(addr) {
            self.memory.add_page(addr);
        }
        match (kind, op) {
            (AccessKind::Instruction, AccessOp::Read) => {
                let _ = self.icache.read(addr, &mut self.memory, None);
            }
            (AccessKind::Instruction, AccessOp::Write) => {}
            (AccessKind::Data, AccessOp::Read) => {
                let _ = self.dcache.read(addr, &mut self.memory, None);
            }
            (AccessKind::Data, AccessOp::Write) => {
                self.dcache.write(addr, 0, &mut self.memory, None);
            }
        }
    }

    /// The instruction cache.
    pub fn icache(&self) -> &Cache {
        &self.icache
    }

    /// The data cache.
    pub fn dcache(&self) -> &Cache {
        &self.dcache
    }

    /// The backing store.
    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }
}
