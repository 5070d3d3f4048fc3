//! Rebuild a deck from a template and a slide sequence.
//!
//! ```text
//! deck-rearrange template.pptx output.pptx 0,34,34,50,52
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use deckweave::compose::{ComposeOptions, SequenceSpec, compose_file};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "deck-rearrange", version)]
struct Cli {
    /// Template deck to take slides from.
    template: PathBuf,

    /// Where to write the recomposed deck.
    output: PathBuf,

    /// Comma-separated, 0-based template slide indices in output order.
    /// Repeat an index to duplicate that slide.
    sequence: String,

    /// Keep parts that deleted slides leave unreferenced.
    #[arg(long, default_value_t = false)]
    keep_orphans: bool,

    /// Log every slot decision.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let sequence = SequenceSpec::parse(&cli.sequence)?;
    let options = ComposeOptions::new().with_prune_orphans(!cli.keep_orphans);
    let report = compose_file(&cli.template, &cli.output, &sequence, &options)
        .with_context(|| format!("rearrange '{}'", cli.template.display()))?;

    eprintln!("wrote {}", cli.output.display());
    eprintln!(
        "{} slides ({} duplicated, {} removed, {} moved)",
        report.slots, report.clones_created, report.slides_deleted, report.moves
    );
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
