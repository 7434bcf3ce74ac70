//! Single-level cache simulator CLI.
//!
//! Runs the same split-dialect trace (`<op> <hex-addr> <type>`) through two
//! configurations and appends one CSV row for each to `<trace>.csv`:
//! 1. **Unified:** one 16 KiB direct-mapped cache taking every access, the
//!    type tag notwithstanding.
//! 2. **Split:** an 8 KiB instruction cache plus an 8 KiB data cache; `I`
//!    routes to the former (writes dropped), `D` to the latter.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use csim_core::config::CachePolicy;
use csim_core::error::SimError;
use csim_core::hierarchy::{SplitCache, UnifiedCache};
use csim_core::report::{self, SingleLevelRow};
use csim_core::stats::CacheStats;
use csim_core::trace::{self, SplitRecord};

/// Unified cache capacity.
const UNIFIED_SIZE: u32 = 16 * 1024;
/// Capacity of each half of the split pair.
const SPLIT_SIZE_EACH: u32 = 8 * 1024;
/// Cache line size.
const BLOCK_SIZE: u32 = 64;
/// Direct-mapped.
const ASSOCIATIVITY: u32 = 1;
/// Hit cost in cycles.
const HIT_LATENCY: u64 = 1;
/// Miss cost in cycles (straight to memory).
const MISS_LATENCY: u64 = 100;

#[derive(Parser, Debug)]
#[command(
    name = "csim-single",
    version,
    about = "Single-level cache simulator (unified and split I/D passes)",
    long_about = "Replays a `<op> <hex-addr> <type>` trace through a unified \
single-level cache and through a split instruction/data pair, appending one \
CSV row per configuration to `<trace>.csv`."
)]
struct Cli {
    /// Memory-access trace file.
    trace: PathBuf,

    /// Log every access as it is simulated.
    #[arg(short = 's', long = "show-accesses")]
    show_accesses: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("csim-single: {e}");
        process::exit(1);
    }
}

/// Runs both configurations and writes the report.
fn run(cli: &Cli) -> Result<(), SimError> {
    let records = trace::read_split(&cli.trace)?;

    let rows = vec![
        run_unified(&records, cli.show_accesses)?,
        run_split(&records, cli.show_accesses)?,
    ];

    let csv_path = report::single_level_csv_path(&cli.trace);
    report::write_single_level_csv(&csv_path, &rows)?;
    println!("Results written to {}", csv_path.display());
    Ok(())
}

fn single_level_policy(cache_size: u32) -> CachePolicy {
    CachePolicy::new(
        cache_size,
        BLOCK_SIZE,
        ASSOCIATIVITY,
        HIT_LATENCY,
        MISS_LATENCY,
    )
}

/// Miss rate as a fraction, the single-level report's convention.
fn miss_fraction(stats: &CacheStats) -> f64 {
    let total = stats.accesses();
    if total == 0 {
        0.0
    } else {
        stats.num_miss as f64 / total as f64
    }
}

/// Drives every record through one unified cache, type tags ignored.
fn run_unified(records: &[SplitRecord], show_accesses: bool) -> Result<SingleLevelRow, SimError> {
    let mut unified = UnifiedCache::new(single_level_policy(UNIFIED_SIZE))?;
    println!("--- Unified cache ---");
    unified.cache().print_info();

    for (n, record) in records.iter().enumerate() {
        if show_accesses {
            println!("access {}: {:?} {:#x}", n + 1, record.op, record.addr);
        }
        unified.access(record.op, record.addr);
    }

    println!("--- Unified cache results ---");
    unified.cache().print_statistics();

    let stats = unified.cache().stats();
    Ok(SingleLevelRow {
        cache_size: UNIFIED_SIZE,
        block_size: BLOCK_SIZE,
        associativity: ASSOCIATIVITY,
        miss_rate: miss_fraction(stats),
        total_cycles: stats.total_cycles,
    })
}

/// Drives every record through the split pair, routing by type tag.
fn run_split(records: &[SplitRecord], show_accesses: bool) -> Result<SingleLevelRow, SimError> {
    let mut split = SplitCache::new(
        single_level_policy(SPLIT_SIZE_EACH),
        single_level_policy(SPLIT_SIZE_EACH),
    )?;
    println!("--- Split I/D caches ---");
    split.icache().print_info();

    for (n, record) in records.iter().enumerate() {
        if show_accesses {
            println!(
                "access {}: {:?} {:#x} ({:?})",
                n + 1,
                record.op,
                record.addr,
                record.kind
            );
        }
        split.access(record.op, record.addr, record.kind);
    }

    println!("--- Instruction cache results ---");
    split.icache().print_statistics();
    println!("--- Data cache results ---");
    split.dcache().print_statistics();

    let icache = split.icache().stats();
    let dcache = split.dcache().stats();
    let combined = CacheStats {
        num_read: icache.num_read + dcache.num_read,
        num_write: icache.num_write + dcache.num_write,
        num_hit: icache.num_hit + dcache.num_hit,
        num_miss: icache.num_miss + dcache.num_miss,
        // The halves run side by side; the slower one bounds the pair.
        total_cycles: icache.total_cycles.max(dcache.total_cycles),
    };
    Ok(SingleLevelRow {
        cache_size: SPLIT_SIZE_EACH * 2,
        block_size: BLOCK_SIZE,
        associativity: ASSOCIATIVITY,
        miss_rate: miss_fraction(&combined),
        total_cycles: combined.total_cycles,
    })
}
