//! AgriSense prediction CLI
//!
//! Reads one JSON object from stdin and writes one JSON object to stdout.
//! Logs go to stderr.

use agrisense_ai_core::log::{init_logging, LogTarget};
use agrisense_ai_core::ArtifactPaths;
use agrisense_ai_predictor::{parse_input, PredictionOutput, PredictionService};
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};

#[derive(Parser, Debug)]
#[command(name = "agrisense-predict")]
#[command(author = "AgriSense Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Predict crop yield for one JSON record read from stdin", long_about = None)]
struct Args {
    /// Directory holding model.bin, model.hash and model_summary.json
    /// [default: $AGRISENSE_MODEL_DIR or server/models]
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<PredictionOutput> {
    let paths = ArtifactPaths::resolve(args.model_dir.as_deref());
    debug!("Loading model from: {}", paths.dir.display());
    let service = PredictionService::open(&paths)?;

    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("Failed to read stdin")?;
    let input = parse_input(&raw)?;

    Ok(service.predict(&input)?)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    if let Err(err) = init_logging(log_level, LogTarget::Stderr) {
        eprintln!("{err}");
    }

    let (body, code) = match run(&args) {
        Ok(output) => match serde_json::to_string(&output) {
            Ok(body) => (body, ExitCode::SUCCESS),
            Err(err) => (json!({ "error": err.to_string() }).to_string(), ExitCode::FAILURE),
        },
        Err(err) => (json!({ "error": format!("{err:#}") }).to_string(), ExitCode::FAILURE),
    };
    println!("{body}");
    code
}
