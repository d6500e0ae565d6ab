//! Terminal host for the static classification screen.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use daisy_lens_lib::config::ScreenConfig;
use daisy_lens_lib::logging::{init_logging, LogConfig};
use daisy_lens_lib::models::classify_types::ScreenStatus;

/// Classify the bundled picture with the bundled model and show the top label.
#[derive(Parser, Debug)]
#[command(name = "daisy-lens", version, about, long_about = None)]
struct Cli {
    /// Directory holding model.onnx, config.json and drawable/
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// JSON file overriding the screen configuration
    #[arg(short, long, default_value = "screen.json")]
    config: PathBuf,

    /// Try GPU execution providers before the CPU
    #[arg(long)]
    gpu: bool,

    /// Print the screen state as JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config)?;

    let mut config = ScreenConfig::load_or_default(&cli.config);
    if let Some(assets) = cli.assets {
        config.asset_dir = assets;
    }
    config.use_gpu |= cli.gpu;

    let state = daisy_lens_lib::run(config);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        println!("{}", state.message());
        match &state.status {
            ScreenStatus::Failed { stage, reason } => eprintln!("{:?} failed: {}", stage, reason),
            ScreenStatus::NoResult => eprintln!("No result"),
            _ => {}
        }
    }

    Ok(if state.status.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
