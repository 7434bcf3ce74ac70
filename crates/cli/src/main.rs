//! Multi-level cache simulator CLI.
//!
//! This binary drives the full hierarchy over a trace:
//! 1. **Parse:** trace path, an optional L1 technique flag (`-p`, `-f`,
//!    `-v`, mutually exclusive), and an optional JSON parameter override.
//! 2. **Simulate:** replay every `<op> <hex-addr>` record against
//!    L1 -> L2 -> L3.
//! 3. **Report:** print per-level statistics and write
//!    `<trace>_multi_level.csv` next to the trace.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use csim_core::config::{HierarchyConfig, Technique};
use csim_core::error::SimError;
use csim_core::hierarchy::CacheHierarchy;
use csim_core::{report, trace};

#[derive(Parser, Debug)]
#[command(
    name = "csim",
    version,
    about = "Trace-driven multi-level cache hierarchy simulator",
    long_about = "Replays a memory-access trace against a modeled L1 -> L2 -> L3 cache \
hierarchy and reports per-level hits, misses, miss rate, and modeled cycles.\n\n\
The trace is a whitespace-separated token stream of `<op> <hex-addr>` records \
with op in {r, w}. Results are written next to the trace as \
`<trace>_multi_level.csv`.\n\n\
Examples:\n  csim traces/gemm.trace\n  csim traces/gemm.trace -p\n  \
csim traces/gemm.trace -v --config hierarchy.json"
)]
struct Cli {
    /// Memory-access trace file.
    trace: PathBuf,

    /// Enable stride prefetching on L1.
    #[arg(short = 'p', long = "prefetch", group = "technique")]
    prefetch: bool,

    /// Rebuild L1 fully associative with FIFO replacement.
    #[arg(short = 'f', long = "fifo", group = "technique")]
    fifo: bool,

    /// Attach a fully-associative victim buffer to L1.
    #[arg(short = 'v', long = "victim", group = "technique")]
    victim: bool,

    /// JSON file overriding the default hierarchy parameters.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn technique(&self) -> Technique {
        if self.prefetch {
            Technique::Prefetch
        } else if self.fifo {
            Technique::Fifo
        } else if self.victim {
            Technique::Victim
        } else {
            Technique::None
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("csim: {e}");
        process::exit(1);
    }
}

/// Loads the trace, replays it, and writes the report.
fn run(cli: &Cli) -> Result<(), SimError> {
    let config = match &cli.config {
        Some(path) => HierarchyConfig::from_json_file(path)?,
        None => HierarchyConfig::default(),
    };
    let records = trace::read_multi(&cli.trace)?;

    let mut hierarchy = CacheHierarchy::new(&config, cli.technique())?;
    for record in &records {
        hierarchy.access(record.op, record.addr);
    }

    hierarchy.print_statistics();
    let csv_path = report::multi_level_csv_path(&cli.trace);
    report::write_multi_level_csv(&csv_path, &hierarchy.levels())?;
    println!("Results written to {}", csv_path.display());
    Ok(())
}
