//! Replace the text of a deck from a JSON payload.
//!
//! ```text
//! deck-replace input.pptx replacements.json output.pptx
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use deckweave::inventory::{EstimatorOptions, TextMetricsEstimator};
use deckweave::replace::{ReplaceOptions, replace_file};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "deck-replace", version)]
struct Cli {
    /// Deck to edit.
    input: PathBuf,

    /// Replacement payload JSON.
    payload: PathBuf,

    /// Where to write the edited deck.
    output: PathBuf,

    /// Inches a shape's overflow may grow before the edit is rejected.
    #[arg(long, default_value_t = 0.01)]
    tolerance: f64,

    /// Report inventory warnings without failing.
    #[arg(long, default_value_t = false)]
    allow_warnings: bool,

    /// Log every shape decision.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let extractor = TextMetricsEstimator::new(EstimatorOptions::default());
    let options = ReplaceOptions::new()
        .with_overflow_tolerance(cli.tolerance)
        .with_fail_on_warnings(!cli.allow_warnings);
    let report = replace_file(&cli.input, &cli.payload, &cli.output, &extractor, &options)
        .with_context(|| format!("replace text in '{}'", cli.input.display()))?;

    eprintln!("wrote {}", cli.output.display());
    eprintln!("processed {} slides", report.slides);
    eprintln!("  - shapes processed: {}", report.shapes_processed);
    eprintln!("  - shapes cleared: {}", report.shapes_cleared);
    eprintln!("  - shapes replaced: {}", report.shapes_replaced);
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
