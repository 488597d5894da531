use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use env_logger::Env;

use brepmend::document::Document;
use brepmend::imprint::imprint_document;
use brepmend::kernel::rect::RectKernel;
use brepmend::pairs::read_imprint_pairs;
use brepmend::Error;

/// Perform imprinting of overlapping solids, writing results to a new
/// assembly file
///
/// Reads the overlap checker's CSV pair list on stdin; the intersection of
/// any overlapping pair is assigned to the shape with the larger volume.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Fuzzy tolerance for the imprinting boolean operations
    #[clap(long, default_value_t = 0.01, value_name = "T")]
    tolerance: f64,

    /// Input assembly
    input: PathBuf,

    /// Output assembly
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.tolerance < 0.0 {
        bail!(Error::NegativeTolerance(args.tolerance));
    }

    let kernel = RectKernel::new();
    let mut doc = Document::load(&kernel, &args.input)?;

    let stdin = std::io::stdin();
    let pairs = read_imprint_pairs(stdin.lock(), &doc)?;

    let summary = imprint_document(&kernel, &mut doc, &pairs, args.tolerance)?;
    if summary.failed > 0 {
        // refuse to write output built from partially imprinted shapes
        bail!(Error::ImprintFailed(summary.failed));
    }

    doc.write(&kernel, &args.output)?;
    Ok(())
}
