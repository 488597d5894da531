use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::error;

use brepmend::document::Document;
use brepmend::kernel::rect::RectKernel;
use brepmend::overlap::{check_overlaps, OverlapConfig};
use brepmend::pool::default_workers;

/// Find all pairwise intersections between solids
///
/// Writes a CSV row to stdout for each pair of nearby shapes, categorised
/// as 'touch' when vertices, edges, or faces intersect, 'overlap' when the
/// shapes overlap by less than the common volume ratio, and 'bad_overlap'
/// when they overlap by more.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Parallelise over N threads (defaults to all cores)
    #[clap(short, long, value_name = "N")]
    jobs: Option<NonZeroUsize>,

    /// Bounding-boxes closer than C will be checked for overlaps
    #[clap(long, default_value_t = 0.5, value_name = "C")]
    bbox_clearance: f64,

    /// Faces, edges, and vertices closer than T will be merged; repeat to
    /// build a retry ladder (default: 0.001 then 0)
    #[clap(short = 't', long = "imprint-tolerance", value_name = "T")]
    imprint_tolerance: Vec<f64>,

    /// Imprinted volume with ratio below R is considered acceptable
    #[clap(long, default_value_t = 0.01, value_name = "R")]
    max_common_volume_ratio: f64,

    /// Seconds to allow for computing one pairwise intersection; 0
    /// disables the timeout
    #[clap(long, default_value_t = 60, value_name = "T")]
    time_per_pair: u64,

    /// Input assembly
    input: PathBuf,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = OverlapConfig {
        workers: args.jobs.map(NonZeroUsize::get).unwrap_or_else(default_workers),
        bbox_clearance: args.bbox_clearance,
        tolerances: if args.imprint_tolerance.is_empty() {
            OverlapConfig::default().tolerances
        } else {
            args.imprint_tolerance
        },
        max_common_ratio: args.max_common_volume_ratio,
        pair_timeout: (args.time_per_pair > 0).then(|| Duration::from_secs(args.time_per_pair)),
    };
    config.validate()?;

    let kernel = RectKernel::new();
    let doc = Document::load(&kernel, &args.input)?;

    let stdout = std::io::stdout();
    let summary = check_overlaps(&kernel, &doc, &config, &mut stdout.lock())?;

    if summary.has_errors() {
        error!(
            "errors occurred while processing: intersection tests failed={}, \
             overlapped by too much={}",
            summary.failed, summary.bad_overlaps
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
