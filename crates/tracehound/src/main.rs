//! tracehound - match a failure traceback against cached bug reports.
//!
//! CLI entry point: parses arguments, loads the profile config, reads the
//! target traceback, and hands off to the core matcher.

mod cli;
mod output;

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use libtracehound_core::config::Config;
use libtracehound_core::matcher::{find_matches, MatchOptions};
use libtracehound_core::source::SourceRegistry;
use libtracehound_core::TracehoundError;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), TracehoundError> {
    let config_text = fs::read_to_string(&cli.config)?;
    let config = Config::from_json(&config_text)?;

    let trace_text = match &cli.trace_file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let options = MatchOptions {
        refresh: cli.refresh.into(),
        data_dir: cli.data_dir.clone().unwrap_or_else(default_data_dir),
    };
    let registry = SourceRegistry::default();

    let matches = find_matches(&trace_text, &config, &options, &registry)?;
    output::print_matches(&matches, cli.num_results);

    Ok(())
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tracehound")
}
