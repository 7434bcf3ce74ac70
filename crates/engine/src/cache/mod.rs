//! Set-associative cache level.
//!
//! This module implements one level of the simulated hierarchy:
//! 1. **Addressing:** offset / set / tag decomposition of 32-bit addresses
//!    and reconstruction of a resident block's base address.
//! 2. **Lookup:** linear scan over the ways of the home set.
//! 3. **Replacement:** invalid-first, then FIFO (when enabled) or LRU by
//!    reference timestamp.
//! 4. **Fills and write-back:** byte-granular loads from the level below
//!    (or the backing store) and recursive write-back of dirty evictees.
//! 5. **Techniques:** the stride prefetcher and the victim-buffer swap path.
//!
//! Levels chain by ownership: each cache owns the level below it. The
//! backing store and the victim buffer are borrowed per access, so recursion
//! toward memory never aliases them.

/// Stride detector for the hardware prefetcher.
pub mod prefetch;

use std::collections::VecDeque;

use self::prefetch::StrideDetector;
use crate::config::{CachePolicy, Technique};
use crate::error::PolicyError;
use crate::mem::MemoryManager;
use crate::stats::CacheStats;

/// One cache line: tag, state bits, recency stamp, and data.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) valid: bool,
    pub(crate) dirty: bool,
    pub(crate) tag: u32,
    pub(crate) set_id: u32,
    pub(crate) last_ref: u64,
    pub(crate) data: Vec<u8>,
}

/// A simulated cache level.
///
/// Statistics are only counted when the access is driven by the trace (or a
/// higher level's first fill byte); write-back traffic and the trailing
/// bytes of a fill move data without counting.
pub struct Cache {
    policy: CachePolicy,
    technique: Technique,
    blocks: Vec<Block>,
    /// Installation order of block slots; only populated under FIFO, which
    /// runs fully associative, so one queue per cache suffices.
    fifo_queue: VecDeque<usize>,
    ref_counter: u64,
    stats: CacheStats,
    detector: Option<StrideDetector>,
    lower: Option<Box<Cache>>,
}

impl Cache {
    /// Builds a cache level from a policy, wiring it above `lower`.
    ///
    /// Blocks are created once, invalid, each with its fixed home set; their
    /// contents are replaced in place for the rest of the run.
    ///
    /// # Errors
    ///
    /// Returns the violated [`PolicyError`] invariant; no cache is created.
    pub fn new(
        mut policy: CachePolicy,
        technique: Technique,
        lower: Option<Box<Cache>>,
    ) -> Result<Self, PolicyError> {
        policy.normalize()?;
        let blocks = (0..policy.block_num)
            .map(|i| Block {
                valid: false,
                dirty: false,
                tag: 0,
                set_id: i / policy.associativity,
                last_ref: 0,
                data: vec![0; policy.block_size as usize],
            })
            .collect();
        let detector = (technique == Technique::Prefetch).then(StrideDetector::new);
        Ok(Self {
            policy,
            technique,
            blocks,
            fifo_queue: VecDeque::new(),
            ref_counter: 0,
            stats: CacheStats::default(),
            detector,
            lower,
        })
    }

    /// Counted read as issued by the trace driver.
    pub fn read(
        &mut self,
        addr: u32,
        memory: &mut MemoryManager,
        victim: Option<&mut Cache>,
    ) -> u8 {
        self.get_byte(addr, true, memory, victim)
    }

    /// Counted write as issued by the trace driver.
    pub fn write(
        &mut self,
        addr: u32,
        val: u8,
        memory: &mut MemoryManager,
        victim: Option<&mut Cache>,
    ) {
        self.set_byte(addr, val, true, memory, victim);
    }

    /// Reads one byte through this level.
    ///
    /// `count_stats` controls hit/miss and cycle accounting: a fill from a
    /// higher level counts only its first byte here, and write-back stores
    /// never count. Lower levels are recursed into with the victim slot
    /// empty; only the first level ever holds a victim buffer.
    pub fn get_byte(
        &mut self,
        addr: u32,
        count_stats: bool,
        memory: &mut MemoryManager,
        mut victim: Option<&mut Cache>,
    ) -> u8 {
        if count_stats {
            self.ref_counter += 1;
            self.stats.num_read += 1;
        }
        self.run_prefetcher(addr, memory);

        if let Some(idx) = self.find_block(addr) {
            if count_stats {
                self.stats.num_hit += 1;
                self.stats.total_cycles += self.policy.hit_latency;
            }
            self.blocks[idx].last_ref = self.ref_counter;
            return self.blocks[idx].data[self.offset_of(addr) as usize];
        }

        if self.technique == Technique::Victim {
            if let Some(buffer) = victim.as_deref_mut() {
                if let Some(buffer_idx) = buffer.find_block(addr) {
                    let slot = self.lift_from_victim(addr, buffer_idx, buffer, memory);
                    if count_stats {
                        self.stats.num_hit += 1;
                        self.stats.total_cycles +=
                            buffer.policy.hit_latency + self.policy.hit_latency;
                    }
                    return self.blocks[slot].data[self.offset_of(addr) as usize];
                }
            }
        }

        if count_stats {
            self.stats.num_miss += 1;
            self.stats.total_cycles += self.policy.miss_latency;
        }
        let slot = self.load_block(addr, memory, victim);
        self.blocks[slot].last_ref = self.ref_counter;
        self.blocks[slot].data[self.offset_of(addr) as usize]
    }

    /// Writes one byte through this level (write-allocate + write-back).
    ///
    /// Same flow as [`Cache::get_byte`], except the touched block is marked
    /// dirty and `num_write` is counted instead of `num_read`.
    pub fn set_byte(
        &mut self,
        addr: u32,
        val: u8,
        count_stats: bool,
        memory: &mut MemoryManager,
        mut victim: Option<&mut Cache>,
    ) {
        if count_stats {
            self.ref_counter += 1;
            self.stats.num_write += 1;
        }
        self.run_prefetcher(addr, memory);

        if let Some(idx) = self.find_block(addr) {
            if count_stats {
                self.stats.num_hit += 1;
                self.stats.total_cycles += self.policy.hit_latency;
            }
            let offset = self.offset_of(addr) as usize;
            let block = &mut self.blocks[idx];
            block.dirty = true;
            block.last_ref = self.ref_counter;
            block.data[offset] = val;
            return;
        }

        if self.technique == Technique::Victim {
            if let Some(buffer) = victim.as_deref_mut() {
                if let Some(buffer_idx) = buffer.find_block(addr) {
                    let slot = self.lift_from_victim(addr, buffer_idx, buffer, memory);
                    if count_stats {
                        self.stats.num_hit += 1;
                        self.stats.total_cycles +=
                            buffer.policy.hit_latency + self.policy.hit_latency;
                    }
                    let offset = self.offset_of(addr) as usize;
                    let block = &mut self.blocks[slot];
                    block.dirty = true;
                    block.data[offset] = val;
                    return;
                }
            }
        }

        if count_stats {
            self.stats.num_miss += 1;
            self.stats.total_cycles += self.policy.miss_latency;
        }
        let slot = self.load_block(addr, memory, victim);
        let offset = self.offset_of(addr) as usize;
        let block = &mut self.blocks[slot];
        block.dirty = true;
        block.last_ref = self.ref_counter;
        block.data[offset] = val;
    }

    /// True iff a valid block holding `addr`'s line is resident.
    pub fn contains(&self, addr: u32) -> bool {
        self.find_block(addr).is_some()
    }

    /// Feeds the detector and issues the resulting prefetch, if any.
    ///
    /// A prefetch materializes the target's page, then fills the line unless
    /// it is already resident. The fill flows through the ordinary load path
    /// (including dirty-evictee write-back) but never touches this level's
    /// hit/miss counters.
    fn run_prefetcher(&mut self, addr: u32, memory: &mut MemoryManager) {
        let Some(target) = self.detector.as_mut().and_then(|d| d.observe(addr)) else {
            return;
        };
        if !memory.has_page(target) {
            memory.add_page(target);
        }
        if self.find_block(target).is_none() {
            self.load_block(target, memory, None);
        }
    }

    /// Scans `addr`'s home set; returns the slot of the matching valid block.
    fn find_block(&self, addr: u32) -> Option<usize> {
        let tag = self.tag_of(addr);
        let set = self.set_of(addr);
        let (begin, end) = self.set_range(set);
        for i in begin..end {
            assert_eq!(
                self.blocks[i].set_id, set,
                "block {i} claims set {} while scanning set {set}",
                self.blocks[i].set_id
            );
            if self.blocks[i].valid && self.blocks[i].tag == tag {
                return Some(i);
            }
        }
        None
    }

    /// Picks the replacement slot in `[begin, end)`: the lowest invalid slot,
    /// else the FIFO front (when enabled), else the smallest `last_ref`.
    fn select_victim(&mut self, begin: usize, end: usize) -> usize {
        if let Some(i) = (begin..end).find(|&i| !self.blocks[i].valid) {
            return i;
        }
        if self.technique == Technique::Fifo {
            // Every valid block was enqueued when installed.
            return self
                .fifo_queue
                .pop_front()
                .expect("FIFO queue empty with every block valid");
        }
        (begin..end)
            .min_by_key(|&i| self.blocks[i].last_ref)
            .expect("replacement set is never empty")
    }

    /// Fills `addr`'s line from below and installs it, returning the slot.
    ///
    /// Only the first byte of the fill counts statistics at the level below.
    /// The displaced block goes to the victim buffer when one is attached,
    /// else dirty displaced data is written back at one `miss_latency` of
    /// cost to this level.
    fn load_block(
        &mut self,
        addr: u32,
        memory: &mut MemoryManager,
        mut victim: Option<&mut Cache>,
    ) -> usize {
        let base = addr & !(self.policy.block_size - 1);
        let mut data = vec![0u8; self.policy.block_size as usize];
        for (i, byte) in data.iter_mut().enumerate() {
            let a = base.wrapping_add(i as u32);
            *byte = match self.lower.as_deref_mut() {
                Some(level) => level.get_byte(a, i == 0, memory, None),
                None => memory.get_byte_uncached(a),
            };
        }

        let set = self.set_of(addr);
        let (begin, end) = self.set_range(set);
        let slot = self.select_victim(begin, end);
        if self.technique == Technique::Fifo {
            self.fifo_queue.push_back(slot);
        }

        let filled = Block {
            valid: true,
            dirty: false,
            tag: self.tag_of(addr),
            set_id: set,
            last_ref: self.ref_counter,
            data,
        };
        let displaced = std::mem::replace(&mut self.blocks[slot], filled);

        if displaced.valid {
            if self.technique == Technique::Victim {
                if let Some(buffer) = victim.as_deref_mut() {
                    // Dirty or clean: the line may be re-lifted later, so its
                    // write-back is deferred until the buffer evicts it.
                    let line_base = self.base_addr_of(&displaced);
                    buffer.insert_block(displaced, line_base, memory);
                    return slot;
                }
            }
            if displaced.dirty {
                let wb_base = self.base_addr_of(&displaced);
                Self::write_back_bytes(self.lower.as_deref_mut(), memory, wb_base, &displaced.data);
                self.stats.total_cycles += self.policy.miss_latency;
            }
        }
        slot
    }

    /// Moves `addr`'s line out of the victim buffer into its home set.
    ///
    /// The set's replacement victim is displaced into the buffer; if it was
    /// dirty it also propagates downward at one `miss_latency` of cost.
    /// Returns the slot now holding the lifted line.
    fn lift_from_victim(
        &mut self,
        addr: u32,
        buffer_idx: usize,
        buffer: &mut Cache,
        memory: &mut MemoryManager,
    ) -> usize {
        let mut lifted = buffer.take_block(buffer_idx);
        let set = self.set_of(addr);
        let (begin, end) = self.set_range(set);
        let slot = self.select_victim(begin, end);

        // Blocks carry the tag of the cache holding them; re-tag on the way in.
        lifted.tag = self.tag_of(addr);
        lifted.set_id = set;
        lifted.last_ref = self.ref_counter;
        let displaced = std::mem::replace(&mut self.blocks[slot], lifted);

        if displaced.valid {
            let line_base = self.base_addr_of(&displaced);
            buffer.insert_block(displaced.clone(), line_base, memory);
        }
        if displaced.valid && displaced.dirty {
            let wb_base = self.base_addr_of(&displaced);
            Self::write_back_bytes(self.lower.as_deref_mut(), memory, wb_base, &displaced.data);
            self.stats.total_cycles += self.policy.miss_latency;
        }
        slot
    }

    /// Removes and returns the block at `idx`, leaving the slot invalid.
    fn take_block(&mut self, idx: usize) -> Block {
        let block = self.blocks[idx].clone();
        self.blocks[idx].valid = false;
        block
    }

    /// Places an evicted line into this single-set buffer, displacing a
    /// resident per the buffer's own replacement policy.
    ///
    /// `line_base` is the base address of the incoming line under the donor's
    /// geometry; the block is re-tagged here so this buffer's own lookups
    /// (and later write-backs) resolve it. A dirty displaced resident is
    /// written back toward memory; at that point the line has truly left the
    /// L1/buffer pair.
    pub(crate) fn insert_block(&mut self, mut block: Block, line_base: u32, memory: &mut MemoryManager) {
        let (begin, end) = self.set_range(0);
        let slot = self.select_victim(begin, end);
        if self.blocks[slot].valid && self.blocks[slot].dirty {
            let base = self.base_addr_of(&self.blocks[slot]);
            Self::write_back_bytes(
                self.lower.as_deref_mut(),
                memory,
                base,
                &self.blocks[slot].data,
            );
        }
        block.tag = self.tag_of(line_base);
        block.set_id = self.set_of(line_base);
        self.blocks[slot] = block;
    }

    /// Streams a block's bytes to the level below as uncounted stores, or
    /// straight into the backing store at the bottom of the chain.
    fn write_back_bytes(
        lower: Option<&mut Cache>,
        memory: &mut MemoryManager,
        base: u32,
        data: &[u8],
    ) {
        match lower {
            Some(level) => {
                for (i, &byte) in data.iter().enumerate() {
                    level.set_byte(base.wrapping_add(i as u32), byte, false, memory, None);
                }
            }
            None => {
                for (i, &byte) in data.iter().enumerate() {
                    memory.set_byte_uncached(base.wrapping_add(i as u32), byte);
                }
            }
        }
    }

    /// Byte offset of `addr` within its block.
    fn offset_of(&self, addr: u32) -> u32 {
        addr & (self.policy.block_size - 1)
    }

    /// Home set of `addr`.
    fn set_of(&self, addr: u32) -> u32 {
        (addr >> self.offset_bits()) & (self.policy.num_sets() - 1)
    }

    /// Tag bits of `addr` (everything above offset and set index).
    fn tag_of(&self, addr: u32) -> u32 {
        (u64::from(addr) >> (self.offset_bits() + self.set_bits())) as u32
    }

    /// Base address of the line a resident block holds.
    fn base_addr_of(&self, block: &Block) -> u32 {
        let shift = self.offset_bits() + self.set_bits();
        ((u64::from(block.tag) << shift) as u32) | (block.set_id << self.offset_bits())
    }

    fn offset_bits(&self) -> u32 {
        self.policy.block_size.trailing_zeros()
    }

    fn set_bits(&self) -> u32 {
        self.policy.num_sets().trailing_zeros()
    }

    /// Slot range `[begin, end)` of one set.
    fn set_range(&self, set: u32) -> (usize, usize) {
        let begin = (set * self.policy.associativity) as usize;
        (begin, begin + self.policy.associativity as usize)
    }

    /// This level's statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// This level's validated policy.
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// The technique this level runs with.
    pub fn technique(&self) -> Technique {
        self.technique
    }

    /// The next level toward memory, if any.
    pub fn lower(&self) -> Option<&Cache> {
        self.lower.as_deref()
    }

    /// Base addresses of every valid resident line (diagnostics and tests).
    pub fn resident_lines(&self) -> Vec<u32> {
        self.blocks
            .iter()
            .filter(|b| b.valid)
            .map(|b| self.base_addr_of(b))
            .collect()
    }

    /// True while the prefetcher is armed (always false without one).
    pub fn prefetcher_active(&self) -> bool {
        self.detector.as_ref().is_some_and(StrideDetector::is_active)
    }

    /// Prints the level's geometry and latencies.
    pub fn print_info(&self) {
        println!("  cache size     {} B", self.policy.cache_size);
        println!("  block size     {} B", self.policy.block_size);
        println!("  block count    {}", self.policy.block_num);
        println!("  associativity  {}", self.policy.associativity);
        println!("  hit latency    {}", self.policy.hit_latency);
        println!("  miss latency   {}", self.policy.miss_latency);
    }

    /// Prints this level's counters, then recurses down the chain.
    pub fn print_statistics(&self) {
        println!("----------------------------------------------------------");
        println!("  num_read       {}", self.stats.num_read);
        println!("  num_write      {}", self.stats.num_write);
        println!("  num_hit        {}", self.stats.num_hit);
        println!("  num_miss       {}", self.stats.num_miss);
        println!("  miss_rate      {:.2}%", self.stats.miss_rate());
        println!("  total_cycles   {}", self.stats.total_cycles);
        if let Some(level) = &self.lower {
            println!("  lower level:");
            level.print_statistics();
        }
    }
}
