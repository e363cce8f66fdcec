//! AgriSense yield trainer CLI

use agrisense_ai_core::log::{init_logging, LogTarget};
use agrisense_ai_trainer::{TrainerConfig, YieldTrainer};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "agrisense-train")]
#[command(author = "AgriSense Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train the AgriSense crop yield model", long_about = None)]
struct Args {
    /// Input CSV dataset [default: data/predictions_dataset.csv]
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Fraction of rows held out for evaluation [default: 0.2]
    #[arg(long)]
    test_size: Option<f64>,

    /// Seed for the split and the bootstrap samples [default: 42]
    #[arg(long)]
    random_state: Option<u64>,

    /// Output directory for the model and summary [default: server/models]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of trees [default: 200]
    #[arg(long)]
    trees: Option<usize>,

    /// Maximum tree depth [default: 12]
    #[arg(long)]
    max_depth: Option<usize>,

    /// Minimum samples per leaf [default: 1]
    #[arg(long)]
    min_samples_leaf: Option<usize>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Defaults, then the TOML file, then the environment, then flags
    fn into_config(self) -> Result<TrainerConfig> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::load_from_file(path)?,
            None => TrainerConfig::default(),
        };
        config.load_from_env()?;

        if let Some(csv) = self.csv {
            config.csv = csv;
        }
        if let Some(test_size) = self.test_size {
            config.test_size = test_size;
        }
        if let Some(seed) = self.random_state {
            config.random_state = seed;
        }
        if let Some(output) = self.output {
            config.model_dir = output;
        }
        if let Some(trees) = self.trees {
            config.forest.n_estimators = trees;
        }
        if let Some(depth) = self.max_depth {
            config.forest.max_depth = Some(depth);
        }
        if let Some(leaf) = self.min_samples_leaf {
            config.forest.min_samples_leaf = leaf;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_logging(log_level, LogTarget::Stdout).context("Failed to set tracing subscriber")?;

    info!("AgriSense Yield Trainer v{}", env!("CARGO_PKG_VERSION"));

    let config = args.into_config().context("Invalid configuration")?;
    info!("Training configuration:");
    info!("  CSV: {}", config.csv.display());
    info!("  Output: {}", config.model_dir.display());
    info!("  Test size: {}", config.test_size);
    info!("  Random state: {}", config.random_state);
    info!("  Trees: {}", config.forest.n_estimators);
    info!("  Max depth: {:?}", config.forest.max_depth);
    info!("  Min samples per leaf: {}", config.forest.min_samples_leaf);

    let report = YieldTrainer::new(config).run()?;

    info!("Training completed successfully");
    info!("  Target: {} ({})", report.target.column, report.target.strategy);
    info!("  Model: {}", report.paths.model.display());
    info!("  Summary: {}", report.paths.summary.display());
    info!("  Hash: {}", report.summary.model_hash);

    Ok(())
}
