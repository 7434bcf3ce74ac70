//! CSV report writers.
//!
//! The multi-level run writes one row per cache level next to the trace as
//! `<trace>_multi_level.csv`; the single-level run writes one row per
//! simulated configuration as `<trace>.csv`. Miss rates follow each
//! dialect's convention: a percentage in the multi-level report, a fraction
//! in the single-level report.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::stats::CacheStats;

/// Report path for a multi-level run: `<trace>_multi_level.csv`.
pub fn multi_level_csv_path(trace: &Path) -> PathBuf {
    let mut name = trace.as_os_str().to_os_string();
    name.push("_multi_level.csv");
    PathBuf::from(name)
}

/// Report path for a single-level run: `<trace>.csv`.
pub fn single_level_csv_path(trace: &Path) -> PathBuf {
    let mut name = trace.as_os_str().to_os_string();
    name.push(".csv");
    PathBuf::from(name)
}

/// Writes the per-level multi-level report.
///
/// # Errors
///
/// Any I/O failure while creating or writing the file.
pub fn write_multi_level_csv(path: &Path, levels: &[(&str, &CacheStats)]) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "Level,NumReads,NumWrites,NumHits,NumMisses,MissRate,TotalCycles")?;
    for (name, stats) in levels {
        writeln!(
            out,
            "{},{},{},{},{},{:.2},{}",
            name,
            stats.num_read,
            stats.num_write,
            stats.num_hit,
            stats.num_miss,
            stats.miss_rate(),
            stats.total_cycles
        )?;
    }
    out.flush()
}

/// One configuration row of the single-level report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleLevelRow {
    /// Total simulated capacity in bytes (both halves for a split pair).
    pub cache_size: u32,
    /// Block size in bytes.
    pub block_size: u32,
    /// Ways per set.
    pub associativity: u32,
    /// Miss rate as a fraction in `[0, 1]`.
    pub miss_rate: f64,
    /// Total modeled cycles (the slower half for a split pair).
    pub total_cycles: u64,
}

/// Writes the per-configuration single-level report.
///
/// # Errors
///
/// Any I/O failure while creating or writing the file.
pub fn write_single_level_csv(path: &Path, rows: &[SingleLevelRow]) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "cacheSize,blockSize,associativity,missRate,totalCycles")?;
    for row in rows {
        writeln!(
            out,
            "{},{},{},{:.4},{}",
            row.cache_size, row.block_size, row.associativity, row.miss_rate, row.total_cycles
        )?;
    }
    out.flush()
}
