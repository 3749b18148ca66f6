#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays building scenarios headlessly.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use tilecraft_system_builder::BuilderConfig;

mod scenario;

use scenario::Scenario;

/// Replays a scripted building session and prints the resulting state.
#[derive(Debug, Parser)]
#[command(name = "tilecraft", version, about)]
struct Cli {
    /// Scenario script to replay.
    #[arg(long)]
    scenario: PathBuf,
    /// Builder configuration overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log every builder event.
    #[arg(long)]
    verbose: bool,
}

/// Entry point for the tilecraft command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => BuilderConfig::default(),
    };

    let text = fs::read_to_string(&cli.scenario)
        .with_context(|| format!("failed to read scenario {}", cli.scenario.display()))?;
    let scenario = Scenario::from_toml(&text)
        .with_context(|| format!("failed to parse scenario {}", cli.scenario.display()))?;

    let summary = scenario.run(config)?;
    println!("{summary}");
    Ok(())
}
