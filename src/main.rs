//! Demand Paging Simulator - Main Entry Point
//!
//! Usage: demand-paging [OPTIONS] <TRACE> <FRAMES>
//!
//! Arguments:
//!   TRACE   - File of hexadecimal virtual addresses, one per line
//!   FRAMES  - Number of physical frames
//!
//! Every address is translated through a multi-level page table. Misses
//! are reported as page faults and the page is mapped for later accesses.
//! Diagnostics go through `RUST_LOG` (default `warn`).

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use demand_paging::config::SimConfig;
use demand_paging::constants::*;
use demand_paging::error::Result;
use demand_paging::io::{open_modes, open_trace, replay, write_results, LogCategory, LogOptions, Reporter};
use demand_paging::replacement::ReplacementPolicy;
use demand_paging::vm_manager::MemoryManager;

/// Command-line configuration
#[derive(Parser, Debug)]
#[command(name = "demand-paging")]
#[command(about = "Replay an address trace through a simulated demand-paged MMU")]
#[command(version)]
struct Cli {
    /// Trace file of hexadecimal virtual addresses
    trace: PathBuf,

    /// Number of physical frames
    #[arg(allow_negative_numbers = true)]
    frames: i64,

    /// File of r/w access modes, consumed one per address
    #[arg(short, long)]
    modes: Option<PathBuf>,

    /// Age in accesses after which an unreferenced page is no longer recent
    #[arg(short = 'a', long = "age", default_value_t = RECENT_AGE as i64, allow_negative_numbers = true)]
    recent_age: i64,

    /// Stop after this many addresses
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    limit: Option<i64>,

    /// Extra output category (repeatable): offset, summary, bitmasks, va2pa,
    /// vpns_pfn, vpn2pfn_pr; the last four are always on
    #[arg(short = 'l', long = "log")]
    log: Vec<LogCategory>,

    /// Replacement policy: wsclock or legacy
    #[arg(short, long, default_value_t = ReplacementPolicy::WsClock)]
    policy: ReplacementPolicy,

    /// Virtual address width in bits
    #[arg(long, default_value_t = ADDRESS_BITS)]
    address_bits: u32,

    /// Page size in bytes
    #[arg(long, default_value_t = PAGE_SIZE)]
    page_size: u64,

    /// Entries per page-table level
    #[arg(long, default_value_t = ENTRIES_PER_LEVEL as u64)]
    entries_per_level: u64,

    /// Explicit bits per page-table level, most significant first (e.g. 8,6,6)
    #[arg(long, value_delimiter = ',')]
    level_bits: Option<Vec<u32>>,

    /// Write one physical address (or -1 for a fault) per translated address
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn sim_config(&self) -> SimConfig {
        SimConfig {
            address_bits: self.address_bits,
            page_size: self.page_size,
            entries_per_level: self.entries_per_level,
            level_bits: self.level_bits.clone(),
            frames: self.frames,
            recent_age: self.recent_age,
            policy: self.policy,
            limit: self.limit,
        }
    }

    fn log_options(&self) -> LogOptions {
        LogOptions::standard().with_categories(&self.log)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // Run the simulator and handle any errors
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main logic separated from main() for cleaner error handling
fn run(cli: &Cli) -> Result<()> {
    // Step 1: Validate configuration before touching any input
    let config = cli.sim_config().validate()?;

    // Step 2: Open the trace and the optional access modes
    let trace = open_trace(&cli.trace, &config.layout)?;
    let modes = cli.modes.as_ref().map(open_modes).transpose()?;

    log::info!(
        "replaying {} with {} frames, {} policy, {:?} bits per level",
        cli.trace.display(),
        config.frames,
        config.policy,
        config.layout.level_bits()
    );

    // Step 3: Replay
    let mut mm = MemoryManager::new(&config);
    let stdout = io::stdout();
    let mut reporter = Reporter::new(BufWriter::new(stdout.lock()), cli.log_options());

    let report = match modes {
        Some(modes) => replay(&mut mm, trace, modes, &mut reporter, config.limit)?,
        None => replay(&mut mm, trace, std::iter::empty(), &mut reporter, config.limit)?,
    };
    reporter.into_inner().flush()?;

    if report.skipped > 0 {
        log::warn!("skipped {} malformed trace lines", report.skipped);
    }

    // Step 4: Write per-address results if requested
    if let Some(path) = &cli.output {
        write_results(path, &report.results)?;
        log::info!("results written to {}", path.display());
    }

    Ok(())
}
