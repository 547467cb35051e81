use std::path::PathBuf;

use clap::Parser;
use flexi_logger::{AdaptiveFormat, Logger, WriteMode};
use lib_sensei::prelude::*;

#[derive(Clone, Debug, Parser)]
#[command(about = "Reviews a recorded game of Go with a KataGo analysis engine")]
struct Options {
    /// The parsed game record: a JSON array of property-bag nodes.
    record: PathBuf,

    /// The engine and accuracy configuration.
    #[arg(short, long, default_value = "configuration/sensei.json")]
    config: PathBuf,

    /// Where the analysis CSV lands; defaults to the record path with a
    /// .csv extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    // Initialize program options and environment.
    let _ = dotenvy::dotenv();
    let options = Options::parse();
    let _logger = Logger::try_with_env_or_str(
        options.log_level.clone().unwrap_or("info".into()).as_str(),
    )?
    .write_mode(WriteMode::BufferAndFlush)
    .log_to_stderr()
    .adaptive_format_for_stderr(match cfg!(debug_assertions) {
        true => AdaptiveFormat::WithThread,
        _ => AdaptiveFormat::Default,
    })
    .start()?;

    if let Err(e) = run(&options) {
        log::error!("fatal error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn run(options: &Options) -> Result<()> {
    let config = ReviewConfig::load(&options.config)?;

    if !options.record.is_file() {
        return Err(Error::ConfigInvalid(format!(
            "record path {} is missing or not a file",
            options.record.display()
        )));
    }
    let contents = std::fs::read_to_string(&options.record)
        .map_err(|e| Error::SgfParse(format!("cannot read {}: {e}", options.record.display())))?;
    let record = GameRecord::from_json(&contents)?;

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| options.record.with_extension("csv"));

    log::info!("reviewing {}...", options.record.display());
    let analysis = review_game(&config, &record, &output)?;
    log::info!(
        "{} moves reviewed; table written to {}",
        analysis.len(),
        output.display()
    );
    Ok(())
}
