//! attrisk: Employee Attrition Risk CLI Tool
//!
//! Engineers features from HR extracts, trains the attrition model and
//! scores employee payloads against the exported artifacts.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use attrisk::cli::{run_features, run_groups, run_predict, run_train, Cli, Commands};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("attrisk=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Features { input, output } => run_features(input, output.as_deref()),
        Commands::Groups { input, target } => run_groups(input, target),
        Commands::Train(args) => run_train(args),
        Commands::Predict(args) => run_predict(args),
    }
}
