use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cm_config::CloudmarkConfig;
use cm_runtime::tracing_init::init_tracing;
use cm_runtime::{Pipeline, PluginRegistry};

#[derive(Parser)]
#[command(name = "cloudmark", about = "Cloud security findings pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline over JSON Lines records
    Run {
        /// Path to cloudmark.toml
        #[arg(short, long)]
        config: PathBuf,
        /// Record file; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Validate the config and every plugin it names, without running
    Check {
        /// Path to cloudmark.toml
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Canonical config path plus the directory relative paths resolve against.
fn locate(config: &Path) -> Result<(PathBuf, PathBuf)> {
    let path = config
        .canonicalize()
        .with_context(|| format!("config path '{}'", config.display()))?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .context("config path has no parent directory")?;
    Ok((path, base_dir))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, input } => {
            let (config_path, base_dir) = locate(&config)?;
            let cm_config = CloudmarkConfig::load(&config_path)?;
            let _guard = init_tracing(&cm_config.logging, &base_dir)?;

            let pipeline =
                Pipeline::from_config(&cm_config, &base_dir).map_err(|e| anyhow::anyhow!("{e}"))?;
            let reader: Box<dyn BufRead> = match &input {
                Some(path) => Box::new(BufReader::new(
                    File::open(path).with_context(|| format!("input '{}'", path.display()))?,
                )),
                None => Box::new(io::stdin().lock()),
            };
            let summary = pipeline.run(reader).map_err(|e| anyhow::anyhow!("{e}"))?;
            tracing::info!(
                domain = "sys",
                records = summary.records,
                events = summary.events,
                skipped = summary.skipped,
                "cloudmark run complete"
            );
        }
        Commands::Check { config } => {
            let (config_path, base_dir) = locate(&config)?;
            let cm_config = CloudmarkConfig::load(&config_path)?;
            let _guard = init_tracing(&cm_config.logging, &base_dir)?;

            PluginRegistry::builtin()
                .check(&cm_config, &base_dir)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!(
                "{}: ok ({} events, {} alerts)",
                config_path.display(),
                cm_config.events.len(),
                cm_config.alerts.len()
            );
        }
    }

    Ok(())
}
