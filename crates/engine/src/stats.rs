//! Per-level access statistics.
//!
//! Counters are monotone across accesses; the only structural subtlety is
//! that a victim-buffer swap counts as a single first-level hit, so
//! `num_hit + num_miss == num_read + num_write` holds at the level driven by
//! the trace (prefetching adds uncounted fills at lower levels only).

/// Monotone counters for one cache level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Counted read accesses.
    pub num_read: u64,
    /// Counted write accesses.
    pub num_write: u64,
    /// Counted lookups that found the line resident (or in the victim buffer).
    pub num_hit: u64,
    /// Counted lookups that had to fill from below.
    pub num_miss: u64,
    /// Modeled cycles: hit/miss latencies plus write-back costs.
    pub total_cycles: u64,
}

impl CacheStats {
    /// Total counted lookups.
    pub fn accesses(&self) -> u64 {
        self.num_hit + self.num_miss
    }

    /// Miss rate as a percentage in `[0, 100]`; 0 when nothing was counted.
    pub fn miss_rate(&self) -> f64 {
        let total = self.accesses();
        if total == 0 {
            0.0
        } else {
            self.num_miss as f64 * 100.0 / total as f64
        }
    }

    /// Prints one aligned statistics row for a named cache level.
    pub fn print_row(&self, name: &str) {
        println!(
            "  {:<8} reads: {:<9} | writes: {:<9} | hits: {:<9} | misses: {:<9} | miss_rate: {:.2}% | cycles: {}",
            name,
            self.num_read,
            self.num_write,
            self.num_hit,
            self.num_miss,
            self.miss_rate(),
            self.total_cycles
        );
    }
}
