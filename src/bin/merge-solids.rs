use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

use brepmend::document::Document;
use brepmend::kernel::rect::RectKernel;
use brepmend::merge::merge_document;

/// Merge surfaces across solids: identical sub-geometry becomes shared
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Sub-shapes closer than T are considered coincident
    #[clap(long, default_value_t = 0.001, value_name = "T")]
    tolerance: f64,

    /// Input assembly
    input: PathBuf,

    /// Output assembly
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let kernel = RectKernel::new();
    let doc = Document::load(&kernel, &args.input)?;

    let merged = merge_document(&kernel, &doc, args.tolerance)?;
    merged.write(&kernel, &args.output)?;
    Ok(())
}
